//! Snapshot engine: capture and restore behind one write guard.
//!
//! Every write-path operation (capture, restore, import, delete, cleanup) first takes
//! the engine's busy flag with a compare-exchange; a second caller gets `Busy`
//! immediately instead of waiting. The flag is released by `BusyGuard::drop`, so
//! early returns and errors never leave the engine stuck.
//!
//! Read-only views (listing, stats, integrity scan, export reads) only take the
//! index read lock and may run while a write is in flight.
//!
//! Capture pipeline:
//!   guard -> producer.snapshot() -> frame record -> serialize -> size gate
//!         -> validate -> store.put -> [index write lock] append+persist -> retention(tier)
//!         -> (manual) last-backup marker -> release
//! The payload write happens before the index write lock is taken. A retention
//! failure after the index is persisted is logged; the capture still succeeds.
//!
//! Restore pipeline:
//!   guard -> store.get -> validate -> decode -> consumer.apply -> release
//! The stored record is only read, never rewritten.

use anyhow::anyhow;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::config::SnapConfig;
use crate::consts::{BACKUP_KEY_PREFIX, LAST_MANUAL_KEY};
use crate::error::{Result, SnapshotError};
use crate::index::{MetadataEntry, MetadataIndex};
use crate::metrics::{
    record_capture, record_capture_busy, record_capture_no_project, record_capture_too_large,
    record_delete, record_restore,
};
use crate::record::SnapshotRecord;
use crate::retention::RetentionManager;
use crate::state::{StateConsumer, StateProducer};
use crate::store::{check_size, SnapshotStore};
use crate::tier::Tier;
use crate::util::{now_ms, random_hex, sha256_hex};
use crate::validate::validate;

/// Result of a capture that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureOutcome {
    /// A snapshot was written and indexed.
    Captured(MetadataEntry),
    /// The producer had no open project; nothing was written.
    NoActiveProject,
}

impl CaptureOutcome {
    pub fn entry(&self) -> Option<&MetadataEntry> {
        match self {
            CaptureOutcome::Captured(e) => Some(e),
            CaptureOutcome::NoActiveProject => None,
        }
    }
}

/// Holds the engine's busy flag; releases it on drop.
pub(crate) struct BusyGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct LastManualMarker {
    timestamp: u64,
}

pub struct SnapshotEngine {
    store: Arc<dyn SnapshotStore>,
    index: RwLock<MetadataIndex>,
    producer: Arc<dyn StateProducer>,
    consumer: Arc<dyn StateConsumer>,
    retention: RetentionManager,
    max_backup_size_bytes: u64,
    busy: AtomicBool,
    // 0 = no manual backup recorded yet
    last_manual_ms: AtomicU64,
}

impl SnapshotEngine {
    /// Build an engine over `store`, loading the persisted index and marker.
    pub fn open(
        store: Arc<dyn SnapshotStore>,
        producer: Arc<dyn StateProducer>,
        consumer: Arc<dyn StateConsumer>,
        cfg: &SnapConfig,
    ) -> Result<Self> {
        let index = MetadataIndex::load(store.as_ref())?;
        let last_manual = load_last_manual(store.as_ref());
        debug!(
            "engine: opened with {} indexed snapshot(s), last_manual={:?}",
            index.len(),
            last_manual
        );
        Ok(Self {
            store,
            index: RwLock::new(index),
            producer,
            consumer,
            retention: RetentionManager::new(cfg),
            max_backup_size_bytes: cfg.max_backup_size_bytes,
            busy: AtomicBool::new(false),
            last_manual_ms: AtomicU64::new(last_manual.unwrap_or(0)),
        })
    }

    pub fn store(&self) -> &dyn SnapshotStore {
        self.store.as_ref()
    }

    pub fn retention(&self) -> &RetentionManager {
        &self.retention
    }

    pub fn max_backup_size_bytes(&self) -> u64 {
        self.max_backup_size_bytes
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    pub fn last_manual_backup_ms(&self) -> Option<u64> {
        match self.last_manual_ms.load(Ordering::Relaxed) {
            0 => None,
            v => Some(v),
        }
    }

    /// Take the write guard or fail with `Busy`.
    pub(crate) fn try_begin(&self) -> Result<BusyGuard<'_>> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| SnapshotError::Busy)?;
        Ok(BusyGuard { flag: &self.busy })
    }

    pub(crate) fn index_read(&self) -> Result<RwLockReadGuard<'_, MetadataIndex>> {
        self.index
            .read()
            .map_err(|_| SnapshotError::Storage(anyhow!("metadata index lock poisoned")))
    }

    fn index_write(&self) -> Result<RwLockWriteGuard<'_, MetadataIndex>> {
        self.index
            .write()
            .map_err(|_| SnapshotError::Storage(anyhow!("metadata index lock poisoned")))
    }

    /// Snapshot listing, newest first.
    pub fn list(&self, tier: Option<Tier>) -> Result<Vec<MetadataEntry>> {
        Ok(self.index_read()?.list(tier))
    }

    pub fn entry(&self, key: &str) -> Result<Option<MetadataEntry>> {
        Ok(self.index_read()?.get(key).cloned())
    }

    /// Capture the producer's current state into `tier`.
    ///
    /// `description` is required (non-blank) for `Manual` and ignored otherwise.
    pub fn capture(&self, tier: Tier, description: Option<&str>) -> Result<CaptureOutcome> {
        let description = match tier {
            Tier::Manual => match description.map(str::trim) {
                Some(d) if !d.is_empty() => d,
                _ => return Err(SnapshotError::InvalidDescription),
            },
            Tier::Imported => return Err(SnapshotError::InvalidTier { tier }),
            Tier::Auto | Tier::Safety => "",
        };

        let guard = match self.try_begin() {
            Ok(g) => g,
            Err(e) => {
                record_capture_busy();
                return Err(e);
            }
        };

        let state = match self.producer.snapshot()? {
            Some(s) => s,
            None => {
                debug!("capture: tier={} skipped, no active project", tier);
                record_capture_no_project();
                return Ok(CaptureOutcome::NoActiveProject);
            }
        };

        let timestamp = now_ms();
        let record = SnapshotRecord::capture(tier, timestamp, description, &state)?;
        let entry = self.admit(&guard, &record)?;

        if tier == Tier::Manual {
            self.mark_manual(entry.timestamp);
        }

        info!(
            "capture: tier={} key={} size={} B",
            tier, entry.key, entry.size
        );
        drop(guard);
        Ok(CaptureOutcome::Captured(entry))
    }

    /// Serialize, gate, write and index a record, then enforce its tier's cap.
    /// Shared by capture and import; the caller holds the write guard.
    pub(crate) fn admit(
        &self,
        _guard: &BusyGuard<'_>,
        record: &SnapshotRecord,
    ) -> Result<MetadataEntry> {
        let blob = record.to_bytes()?;
        if let Err(e) = check_size(blob.len(), self.max_backup_size_bytes) {
            record_capture_too_large();
            warn!(
                "admit: tier={} rejected, {} B exceeds limit {} B",
                record.tier,
                blob.len(),
                self.max_backup_size_bytes
            );
            return Err(e);
        }
        // freshly framed records must pass the same checks restore applies
        validate(&blob)?;

        // writers are serialized by the guard, so the key stays free until indexed
        let key = {
            let index = self.index_read()?;
            self.fresh_key(&index, record.tier, record.timestamp)?
        };

        // payload goes out with no index lock held; readers keep running
        self.store.put(&key, &blob)?;

        let mut index = self.index_write()?;
        let entry = index.push(MetadataEntry {
            key: key.clone(),
            tier: record.tier,
            timestamp: record.timestamp,
            description: record.description.clone(),
            size: blob.len() as u64,
            seq: 0,
            sha256: Some(sha256_hex(&blob)),
        });
        if let Err(e) = index.save(self.store.as_ref()) {
            index.remove(&key);
            if let Err(de) = self.store.delete(&key) {
                warn!("admit: rollback of '{}' failed: {}", key, de);
            }
            return Err(e);
        }
        record_capture(blob.len());

        // the record is committed at this point; a failed eviction is retried by the
        // next admit or cleanup of this tier
        if let Err(e) = self
            .retention
            .enforce(&mut index, self.store.as_ref(), record.tier)
        {
            warn!(
                "admit: retention for tier={} deferred after '{}': {}",
                record.tier, key, e
            );
        }
        Ok(entry)
    }

    fn fresh_key(&self, index: &MetadataIndex, tier: Tier, timestamp: u64) -> Result<String> {
        for _ in 0..16 {
            let key = format!(
                "{}{}_{}_{}",
                BACKUP_KEY_PREFIX,
                tier.as_str(),
                timestamp,
                random_hex(4)
            );
            if !index.contains(&key) && !self.store.contains(&key)? {
                return Ok(key);
            }
        }
        Err(SnapshotError::Storage(anyhow!(
            "could not allocate a unique snapshot key"
        )))
    }

    fn mark_manual(&self, timestamp: u64) {
        self.last_manual_ms.store(timestamp, Ordering::Relaxed);
        let marker = LastManualMarker { timestamp };
        let res = serde_json::to_vec(&marker)
            .map_err(SnapshotError::from)
            .and_then(|b| self.store.put_meta(LAST_MANUAL_KEY, &b));
        if let Err(e) = res {
            // advisory only
            warn!("capture: cannot persist last manual backup marker: {}", e);
        }
    }

    /// Restore snapshot `key` into live state via the consumer.
    ///
    /// Nothing reaches the consumer unless the stored blob passes validation.
    pub fn restore(&self, key: &str) -> Result<()> {
        let _guard = self.try_begin()?;

        let res = self.restore_inner(key);
        record_restore(res.is_ok());
        match &res {
            Ok(()) => info!("restore: key={} applied", key),
            Err(e) => warn!("restore: key={} failed: {}", key, e),
        }
        res
    }

    fn restore_inner(&self, key: &str) -> Result<()> {
        let blob = self.read_backup(key)?;
        validate(&blob)?;
        let record = SnapshotRecord::from_bytes(&blob)?;
        let state = record.decode_state()?;
        self.consumer.apply(&state)
    }

    /// Raw stored bytes of a backup key.
    pub fn read_backup(&self, key: &str) -> Result<Vec<u8>> {
        if !key.starts_with(BACKUP_KEY_PREFIX) {
            return Err(SnapshotError::not_found(key));
        }
        match self.store.get(key) {
            Err(SnapshotError::InvalidKey { .. }) => Err(SnapshotError::not_found(key)),
            other => other,
        }
    }

    /// Explicit user delete: index entry first, then the payload.
    pub fn delete(&self, key: &str) -> Result<MetadataEntry> {
        let _guard = self.try_begin()?;
        let mut index = self.index_write()?;

        let entry = index
            .remove(key)
            .ok_or_else(|| SnapshotError::not_found(key))?;
        if let Err(e) = index.save(self.store.as_ref()) {
            index.restore_entry(entry);
            return Err(e);
        }
        if let Err(e) = self.store.delete(key) {
            warn!("delete: payload delete failed for '{}': {}", key, e);
        }
        record_delete();
        info!("delete: key={} tier={}", key, entry.tier);
        Ok(entry)
    }

    /// Enforce every capped tier. Used after caps are lowered.
    pub fn cleanup(&self) -> Result<Vec<String>> {
        let _guard = self.try_begin()?;
        let mut index = self.index_write()?;
        let mut evicted = Vec::new();
        for tier in Tier::CAPPED {
            evicted.extend(
                self.retention
                    .enforce(&mut index, self.store.as_ref(), tier)?,
            );
        }
        Ok(evicted)
    }
}

fn load_last_manual(store: &dyn SnapshotStore) -> Option<u64> {
    let bytes = store.get(LAST_MANUAL_KEY).ok()?;
    match serde_json::from_slice::<LastManualMarker>(&bytes) {
        Ok(m) => Some(m.timestamp),
        Err(e) => {
            warn!("engine: ignoring unreadable last manual marker: {}", e);
            None
        }
    }
}
