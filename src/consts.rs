//! Shared constants: defaults, store key layout, schema versions.

// -------- Scheduler defaults --------
pub const DEFAULT_AUTO_INTERVAL_MS: u64 = 5 * 60 * 1000;
pub const DEFAULT_SAFETY_INTERVAL_MS: u64 = 60 * 60 * 1000;

// -------- Retention caps --------
pub const DEFAULT_MAX_AUTO: usize = 10;
pub const DEFAULT_MAX_MANUAL: usize = 50;
pub const DEFAULT_MAX_SAFETY: usize = 5;

// -------- Size gate --------
pub const DEFAULT_MAX_BACKUP_SIZE_BYTES: u64 = 50 * 1024 * 1024;

// -------- Store key layout --------
// backup_<tier>_<timestamp_ms>_<8 hex>
pub const BACKUP_KEY_PREFIX: &str = "backup_";
pub const INDEX_KEY: &str = "meta_index";
pub const LAST_MANUAL_KEY: &str = "meta_last_manual";
pub const MAX_KEY_LEN: usize = 128;

// -------- DirStore --------
pub const STORE_FILE_EXT: &str = "snap";
pub const STORE_LOCK_FILE: &str = "LOCK";

// -------- Formats --------
/// Payload schema tag written into every new record ("MAJOR.MINOR").
pub const SCHEMA_VERSION: &str = "1.0";
pub const SCHEMA_MAJOR: u32 = 1;
/// Version of the persisted metadata index document.
pub const INDEX_VERSION: u32 = 1;

pub const IMPORTED_DESCRIPTION: &str = "imported";
