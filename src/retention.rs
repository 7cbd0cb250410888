//! Retention — per-tier caps with oldest-first eviction.
//!
//! For a tier with cap N holding M > N entries, the M - N entries with the smallest
//! (timestamp, seq) are evicted. Order of removal per run:
//! 1. drop the victims from the in-memory index and persist the index;
//! 2. delete the victims' payloads from the store.
//! An index entry therefore never outlives its payload. A payload delete that fails
//! after step 1 leaves an unindexed record, which `check_integrity` reports.
//!
//! `Imported` has no cap and is never touched.

use log::{info, warn};

use crate::config::SnapConfig;
use crate::error::Result;
use crate::index::MetadataIndex;
use crate::metrics::record_evictions;
use crate::store::SnapshotStore;
use crate::tier::Tier;

#[derive(Debug, Clone)]
pub struct RetentionManager {
    max_auto: usize,
    max_safety: usize,
    max_manual: usize,
}

impl RetentionManager {
    pub fn new(cfg: &SnapConfig) -> Self {
        Self {
            max_auto: cfg.max_auto_backups,
            max_safety: cfg.max_safety_backups,
            max_manual: cfg.max_manual_backups,
        }
    }

    pub fn cap(&self, tier: Tier) -> Option<usize> {
        if !tier.is_evictable() {
            return None;
        }
        match tier {
            Tier::Auto => Some(self.max_auto),
            Tier::Safety => Some(self.max_safety),
            Tier::Manual => Some(self.max_manual),
            Tier::Imported => None,
        }
    }

    /// Keys that `enforce` would evict for `tier`, oldest first.
    pub fn plan(&self, index: &MetadataIndex, tier: Tier) -> Vec<String> {
        let cap = match self.cap(tier) {
            Some(c) => c,
            None => return Vec::new(),
        };
        let entries = index.oldest_first(tier);
        if entries.len() <= cap {
            return Vec::new();
        }
        let excess = entries.len() - cap;
        entries
            .into_iter()
            .take(excess)
            .map(|e| e.key.clone())
            .collect()
    }

    /// Evict the oldest entries of `tier` above its cap. Returns the evicted keys.
    pub fn enforce(
        &self,
        index: &mut MetadataIndex,
        store: &dyn SnapshotStore,
        tier: Tier,
    ) -> Result<Vec<String>> {
        let victims = self.plan(index, tier);
        if victims.is_empty() {
            return Ok(victims);
        }

        let removed: Vec<_> = victims.iter().filter_map(|k| index.remove(k)).collect();
        if let Err(e) = index.save(store) {
            // index not persisted: put the entries back, nothing was deleted
            for entry in removed {
                index.restore_entry(entry);
            }
            return Err(e);
        }

        for key in &victims {
            if let Err(e) = store.delete(key) {
                warn!("retention: payload delete failed for '{}': {}", key, e);
            }
        }

        info!(
            "retention: tier={} evicted {} snapshot(s) (cap={})",
            tier,
            victims.len(),
            self.cap(tier).unwrap_or(0)
        );
        record_evictions(victims.len());
        Ok(victims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::MetadataEntry;
    use crate::store::MemStore;

    fn add(index: &mut MetadataIndex, store: &MemStore, key: &str, tier: Tier, ts: u64) {
        store.put(key, b"{}").unwrap();
        index.push(MetadataEntry {
            key: key.to_string(),
            tier,
            timestamp: ts,
            description: String::new(),
            size: 2,
            seq: 0,
            sha256: None,
        });
    }

    #[test]
    fn evicts_oldest_above_cap() {
        let cfg = SnapConfig::default().with_max_safety_backups(2);
        let rm = RetentionManager::new(&cfg);
        let store = MemStore::new(1 << 20);
        let mut idx = MetadataIndex::new();
        add(&mut idx, &store, "s3", Tier::Safety, 30);
        add(&mut idx, &store, "s1", Tier::Safety, 10);
        add(&mut idx, &store, "s2", Tier::Safety, 20);
        add(&mut idx, &store, "m1", Tier::Manual, 1);

        let evicted = rm.enforce(&mut idx, &store, Tier::Safety).unwrap();
        assert_eq!(evicted, vec!["s1".to_string()]);
        assert!(!idx.contains("s1"));
        assert!(!store.contains("s1").unwrap());
        assert!(idx.contains("m1"), "other tiers untouched");
        assert_eq!(idx.count(Tier::Safety), 2);
    }

    #[test]
    fn ties_evict_first_inserted() {
        let cfg = SnapConfig::default().with_max_auto_backups(1);
        let rm = RetentionManager::new(&cfg);
        let store = MemStore::new(1 << 20);
        let mut idx = MetadataIndex::new();
        add(&mut idx, &store, "first", Tier::Auto, 5);
        add(&mut idx, &store, "second", Tier::Auto, 5);
        assert_eq!(rm.plan(&idx, Tier::Auto), vec!["first".to_string()]);
    }

    #[test]
    fn imported_is_exempt() {
        let cfg = SnapConfig::default();
        let rm = RetentionManager::new(&cfg);
        let store = MemStore::new(1 << 20);
        let mut idx = MetadataIndex::new();
        for i in 0..200u64 {
            add(&mut idx, &store, &format!("i{i}"), Tier::Imported, i);
        }
        assert!(rm.enforce(&mut idx, &store, Tier::Imported).unwrap().is_empty());
        assert_eq!(idx.count(Tier::Imported), 200);
    }
}
