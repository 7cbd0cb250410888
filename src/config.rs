//! Centralized configuration for the snapshot manager.
//!
//! Sources, in increasing priority:
//! - `SnapConfig::default()` — built-in defaults (5 min auto, 1 h safety, caps 10/50/5, 50 MiB).
//! - `SnapConfig::from_json_file()` — a JSON document using the recognized option names
//!   (`autoBackupIntervalMs`, `safetyBackupIntervalMs`, `maxAutoBackups`, `maxManualBackups`,
//!   `maxSafetyBackups`, `maxBackupSizeBytes`, `schedulerEnabled`). Missing keys keep defaults.
//! - `SnapConfig::from_env()` / `apply_env()` — SNAPKEEP_* variables.
//! - fluent `with_*` setters.
//!
//! An interval of 0 disables the corresponding scheduler task.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::time::Duration;

use crate::consts::{
    DEFAULT_AUTO_INTERVAL_MS, DEFAULT_MAX_AUTO, DEFAULT_MAX_BACKUP_SIZE_BYTES, DEFAULT_MAX_MANUAL,
    DEFAULT_MAX_SAFETY, DEFAULT_SAFETY_INTERVAL_MS,
};
use crate::error::{Result, SnapshotError};
use crate::tier::Tier;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SnapConfig {
    /// Auto-tier capture interval.
    /// Env: SNAPKEEP_AUTO_INTERVAL_MS (default 300000)
    pub auto_backup_interval_ms: u64,

    /// Safety-tier capture interval.
    /// Env: SNAPKEEP_SAFETY_INTERVAL_MS (default 3600000)
    pub safety_backup_interval_ms: u64,

    /// Env: SNAPKEEP_MAX_AUTO (default 10)
    pub max_auto_backups: usize,

    /// Env: SNAPKEEP_MAX_MANUAL (default 50)
    pub max_manual_backups: usize,

    /// Env: SNAPKEEP_MAX_SAFETY (default 5)
    pub max_safety_backups: usize,

    /// Upper bound for one serialized snapshot record.
    /// Env: SNAPKEEP_MAX_SIZE_BYTES (default 52428800)
    pub max_backup_size_bytes: u64,

    /// Start the periodic scheduler on `SnapshotManager::init()`.
    /// Env: SNAPKEEP_SCHEDULER = 0|1 (default 1)
    pub scheduler_enabled: bool,
}

impl Default for SnapConfig {
    fn default() -> Self {
        Self {
            auto_backup_interval_ms: DEFAULT_AUTO_INTERVAL_MS,
            safety_backup_interval_ms: DEFAULT_SAFETY_INTERVAL_MS,
            max_auto_backups: DEFAULT_MAX_AUTO,
            max_manual_backups: DEFAULT_MAX_MANUAL,
            max_safety_backups: DEFAULT_MAX_SAFETY,
            max_backup_size_bytes: DEFAULT_MAX_BACKUP_SIZE_BYTES,
            scheduler_enabled: true,
        }
    }
}

fn env_bool(v: &str) -> bool {
    let s = v.trim().to_ascii_lowercase();
    s == "1" || s == "true" || s == "yes" || s == "on"
}

impl SnapConfig {
    /// Defaults overridden by SNAPKEEP_* environment variables.
    pub fn from_env() -> Self {
        Self::default().apply_env()
    }

    /// Overlay SNAPKEEP_* variables on top of `self`. Unparsable values are ignored.
    pub fn apply_env(mut self) -> Self {
        if let Ok(v) = std::env::var("SNAPKEEP_AUTO_INTERVAL_MS") {
            if let Ok(n) = v.trim().parse::<u64>() {
                self.auto_backup_interval_ms = n;
            }
        }
        if let Ok(v) = std::env::var("SNAPKEEP_SAFETY_INTERVAL_MS") {
            if let Ok(n) = v.trim().parse::<u64>() {
                self.safety_backup_interval_ms = n;
            }
        }
        if let Ok(v) = std::env::var("SNAPKEEP_MAX_AUTO") {
            if let Ok(n) = v.trim().parse::<usize>() {
                self.max_auto_backups = n;
            }
        }
        if let Ok(v) = std::env::var("SNAPKEEP_MAX_MANUAL") {
            if let Ok(n) = v.trim().parse::<usize>() {
                self.max_manual_backups = n;
            }
        }
        if let Ok(v) = std::env::var("SNAPKEEP_MAX_SAFETY") {
            if let Ok(n) = v.trim().parse::<usize>() {
                self.max_safety_backups = n;
            }
        }
        if let Ok(v) = std::env::var("SNAPKEEP_MAX_SIZE_BYTES") {
            if let Ok(n) = v.trim().parse::<u64>() {
                self.max_backup_size_bytes = n;
            }
        }
        if let Ok(v) = std::env::var("SNAPKEEP_SCHEDULER") {
            self.scheduler_enabled = env_bool(&v);
        }
        self
    }

    /// Load a JSON config document. Keys not present keep their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let bytes =
            std::fs::read(path).with_context(|| format!("read config {}", path.display()))?;
        let cfg: SnapConfig = serde_json::from_slice(&bytes).map_err(|e| {
            SnapshotError::config(format!("parse {}: {}", path.display(), e))
        })?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject settings that would make every capture fail or evict everything.
    pub fn validate(&self) -> Result<()> {
        if self.max_backup_size_bytes == 0 {
            return Err(SnapshotError::config("maxBackupSizeBytes must be > 0"));
        }
        for t in Tier::CAPPED {
            if self.cap(t) == Some(0) {
                return Err(SnapshotError::config(format!(
                    "retention cap for tier '{}' must be > 0",
                    t
                )));
            }
        }
        Ok(())
    }

    /// Retention cap for a tier; `None` means exempt from eviction.
    pub fn cap(&self, tier: Tier) -> Option<usize> {
        match tier {
            Tier::Auto => Some(self.max_auto_backups),
            Tier::Safety => Some(self.max_safety_backups),
            Tier::Manual => Some(self.max_manual_backups),
            Tier::Imported => None,
        }
    }

    /// Scheduler interval for a periodic tier; `None` when disabled or not periodic.
    pub fn interval(&self, tier: Tier) -> Option<Duration> {
        let ms = match tier {
            Tier::Auto => self.auto_backup_interval_ms,
            Tier::Safety => self.safety_backup_interval_ms,
            _ => return None,
        };
        if ms == 0 {
            None
        } else {
            Some(Duration::from_millis(ms))
        }
    }

    pub fn with_auto_backup_interval_ms(mut self, ms: u64) -> Self {
        self.auto_backup_interval_ms = ms;
        self
    }

    pub fn with_safety_backup_interval_ms(mut self, ms: u64) -> Self {
        self.safety_backup_interval_ms = ms;
        self
    }

    pub fn with_max_auto_backups(mut self, n: usize) -> Self {
        self.max_auto_backups = n;
        self
    }

    pub fn with_max_manual_backups(mut self, n: usize) -> Self {
        self.max_manual_backups = n;
        self
    }

    pub fn with_max_safety_backups(mut self, n: usize) -> Self {
        self.max_safety_backups = n;
        self
    }

    pub fn with_max_backup_size_bytes(mut self, bytes: u64) -> Self {
        self.max_backup_size_bytes = bytes;
        self
    }

    pub fn with_scheduler_enabled(mut self, on: bool) -> Self {
        self.scheduler_enabled = on;
        self
    }

    /// Finish the builder chain.
    pub fn build(self) -> Self {
        self
    }
}

impl fmt::Display for SnapConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SnapConfig {{ \
             auto_backup_interval_ms: {}, \
             safety_backup_interval_ms: {}, \
             max_auto_backups: {}, \
             max_manual_backups: {}, \
             max_safety_backups: {}, \
             max_backup_size_bytes: {}, \
             scheduler_enabled: {} \
             }}",
            self.auto_backup_interval_ms,
            self.safety_backup_interval_ms,
            self.max_auto_backups,
            self.max_manual_backups,
            self.max_safety_backups,
            self.max_backup_size_bytes,
            self.scheduler_enabled,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_constants() {
        let c = SnapConfig::default();
        assert_eq!(c.auto_backup_interval_ms, 300_000);
        assert_eq!(c.safety_backup_interval_ms, 3_600_000);
        assert_eq!(c.cap(Tier::Auto), Some(10));
        assert_eq!(c.cap(Tier::Manual), Some(50));
        assert_eq!(c.cap(Tier::Safety), Some(5));
        assert_eq!(c.cap(Tier::Imported), None);
        assert_eq!(c.max_backup_size_bytes, 52_428_800);
    }

    #[test]
    fn json_uses_recognized_option_names() {
        let c: SnapConfig =
            serde_json::from_str(r#"{"maxManualBackups": 3, "autoBackupIntervalMs": 1000}"#)
                .unwrap();
        assert_eq!(c.max_manual_backups, 3);
        assert_eq!(c.auto_backup_interval_ms, 1000);
        // untouched keys keep defaults
        assert_eq!(c.max_safety_backups, 5);
    }

    #[test]
    fn zero_interval_disables_task() {
        let c = SnapConfig::default().with_safety_backup_interval_ms(0);
        assert!(c.interval(Tier::Safety).is_none());
        assert_eq!(c.interval(Tier::Auto), Some(Duration::from_millis(300_000)));
        assert!(c.interval(Tier::Manual).is_none());
    }

    #[test]
    fn validate_rejects_zero_caps() {
        assert!(SnapConfig::default().with_max_auto_backups(0).validate().is_err());
        assert!(SnapConfig::default()
            .with_max_backup_size_bytes(0)
            .validate()
            .is_err());
        assert!(SnapConfig::default().validate().is_ok());
    }
}
