//! snapkeep — local snapshot/retention manager for project state.
//!
//! Layout:
//! - store/      key -> blob backends (DirStore, MemStore)
//! - record      persisted snapshot record (schemaVersion/tier/timestamp/payload)
//! - validate    structural checks applied before restore and import
//! - index       typed metadata catalog persisted as one store record
//! - retention   per-tier caps, oldest-first eviction
//! - engine      capture/restore/delete behind a single write guard
//! - scheduler   periodic auto/safety capture threads
//! - gateway     export/import of records as files
//! - manager     public service object (init/shutdown lifecycle)

pub mod config;
pub mod consts;
pub mod error;
pub mod lock;
pub mod metrics;
pub mod tier;
pub mod util;

pub mod store;
pub mod state;

pub mod record;
pub mod validate;
pub mod index;
pub mod retention;
pub mod engine;
pub mod scheduler;
pub mod gateway;
pub mod integrity;
pub mod stats;
pub mod manager;

pub use config::SnapConfig;
pub use engine::{CaptureOutcome, SnapshotEngine};
pub use error::{Result, SnapshotError};
pub use index::{MetadataEntry, MetadataIndex};
pub use integrity::{IntegrityIssue, IntegrityReport};
pub use manager::SnapshotManager;
pub use state::{JsonFileState, MemoryState, ProjectState, StateConsumer, StateProducer};
pub use stats::Stats;
pub use store::{DirStore, MemStore, SnapshotStore};
pub use tier::Tier;
