//! SnapshotManager — public service object.
//!
//! Wires a store, a state producer/consumer and a config into an engine plus a
//! scheduler. Lifecycle is explicit:
//!   new()      -> loads the index, nothing runs yet
//!   init()     -> starts the periodic tasks (when enabled)
//!   shutdown() -> stops and joins them; also done on drop
//!
//! Manual-path failures are returned to the caller; scheduled failures are logged.

use log::info;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::SnapConfig;
use crate::engine::{CaptureOutcome, SnapshotEngine};
use crate::error::Result;
use crate::gateway;
use crate::index::MetadataEntry;
use crate::integrity::{self, IntegrityReport};
use crate::scheduler::Scheduler;
use crate::state::{StateConsumer, StateProducer};
use crate::stats::{self, Stats};
use crate::store::SnapshotStore;
use crate::tier::Tier;

pub struct SnapshotManager {
    cfg: SnapConfig,
    engine: Arc<SnapshotEngine>,
    scheduler: Scheduler,
}

impl SnapshotManager {
    pub fn new(
        store: Arc<dyn SnapshotStore>,
        producer: Arc<dyn StateProducer>,
        consumer: Arc<dyn StateConsumer>,
        cfg: SnapConfig,
    ) -> Result<Self> {
        cfg.validate()?;
        let engine = Arc::new(SnapshotEngine::open(store, producer, consumer, &cfg)?);
        let scheduler = Scheduler::new(engine.clone(), &cfg);
        Ok(Self {
            cfg,
            engine,
            scheduler,
        })
    }

    /// Start background capture. Idempotent; a no-op when the scheduler is disabled.
    pub fn init(&self) -> Result<()> {
        if !self.cfg.scheduler_enabled {
            info!("manager: scheduler disabled by config");
            return Ok(());
        }
        self.scheduler.start()
    }

    pub fn shutdown(&self) {
        self.scheduler.stop();
    }

    pub fn config(&self) -> &SnapConfig {
        &self.cfg
    }

    pub fn engine(&self) -> &Arc<SnapshotEngine> {
        &self.engine
    }

    pub fn is_scheduler_running(&self) -> bool {
        self.scheduler.is_running()
    }

    pub fn create_manual_snapshot(&self, description: &str) -> Result<CaptureOutcome> {
        self.engine.capture(Tier::Manual, Some(description))
    }

    /// Capture into `tier` on demand, for hosts that drive their own timers.
    pub fn capture(&self, tier: Tier) -> Result<CaptureOutcome> {
        self.engine.capture(tier, None)
    }

    /// Newest first; `None` lists every tier.
    pub fn list_snapshots(&self, tier: Option<Tier>) -> Result<Vec<MetadataEntry>> {
        self.engine.list(tier)
    }

    pub fn restore_snapshot(&self, key: &str) -> Result<()> {
        self.engine.restore(key)
    }

    pub fn delete_snapshot(&self, key: &str) -> Result<()> {
        self.engine.delete(key).map(|_| ())
    }

    pub fn export_snapshot(&self, key: &str) -> Result<Vec<u8>> {
        gateway::export(&self.engine, key)
    }

    pub fn export_to_path(&self, key: &str, dest: &Path) -> Result<PathBuf> {
        gateway::export_to_path(&self.engine, key, dest)
    }

    /// Import an artifact; returns the new snapshot's key.
    pub fn import_snapshot_file(&self, artifact: &[u8]) -> Result<String> {
        gateway::import(&self.engine, artifact).map(|e| e.key)
    }

    pub fn import_from_path(&self, path: &Path) -> Result<MetadataEntry> {
        gateway::import_file(&self.engine, path)
    }

    pub fn get_stats(&self) -> Result<Stats> {
        stats::collect(&self.engine, self.scheduler.next_auto_eta_ms())
    }

    pub fn check_integrity(&self) -> Result<IntegrityReport> {
        integrity::check(&self.engine)
    }

    /// Enforce every tier's cap; returns the evicted keys.
    pub fn cleanup(&self) -> Result<Vec<String>> {
        self.engine.cleanup()
    }
}

impl Drop for SnapshotManager {
    fn drop(&mut self) {
        self.shutdown();
    }
}
