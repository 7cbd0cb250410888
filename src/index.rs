//! Metadata index — typed catalog of stored snapshots.
//!
//! Listing and eviction work from this catalog without touching payloads. The
//! index lives in memory and is persisted as one store record (`meta_index`):
//! {
//!   "version": 1,
//!   "nextSeq": 17,
//!   "entries": [
//!     {"key":"backup_auto_1760000000000_1a2b3c4d","tier":"auto","timestamp":1760000000000,
//!      "description":"","size":5120,"seq":16,"sha256":"..."},
//!     ...
//!   ]
//! }
//!
//! `seq` is a monotonic insertion counter: equal timestamps are ordered by it, so
//! the first-inserted of two same-millisecond snapshots is the older one.

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::consts::{INDEX_KEY, INDEX_VERSION};
use crate::error::{Result, SnapshotError};
use crate::store::SnapshotStore;
use crate::tier::Tier;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataEntry {
    pub key: String,
    pub tier: Tier,
    pub timestamp: u64,
    #[serde(default)]
    pub description: String,
    /// Byte length of the stored record.
    pub size: u64,
    #[serde(default)]
    pub seq: u64,
    /// Hex SHA-256 of the stored record (absent in entries written without it).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IndexDoc {
    version: u32,
    #[serde(default)]
    next_seq: u64,
    #[serde(default)]
    entries: Vec<MetadataEntry>,
}

#[derive(Debug, Default)]
pub struct MetadataIndex {
    entries: Vec<MetadataEntry>,
    next_seq: u64,
}

impl MetadataIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the persisted index; a store without one yields an empty index.
    pub fn load(store: &dyn SnapshotStore) -> Result<Self> {
        let bytes = match store.get(INDEX_KEY) {
            Ok(b) => b,
            Err(e) if e.is_not_found() => return Ok(Self::new()),
            Err(e) => return Err(e),
        };
        let doc: IndexDoc = serde_json::from_slice(&bytes).context("parse metadata index")?;
        if doc.version != INDEX_VERSION {
            return Err(SnapshotError::Storage(anyhow::anyhow!(
                "unsupported metadata index version {} (expected {})",
                doc.version,
                INDEX_VERSION
            )));
        }
        let max_seq = doc.entries.iter().map(|e| e.seq).max();
        let next_seq = match max_seq {
            Some(m) => doc.next_seq.max(m + 1),
            None => doc.next_seq,
        };
        Ok(Self {
            entries: doc.entries,
            next_seq,
        })
    }

    pub fn save(&self, store: &dyn SnapshotStore) -> Result<()> {
        let doc = IndexDoc {
            version: INDEX_VERSION,
            next_seq: self.next_seq,
            entries: self.entries.clone(),
        };
        let bytes = serde_json::to_vec(&doc)?;
        store.put_meta(INDEX_KEY, &bytes)
    }

    /// Append an entry, stamping it with the next insertion sequence.
    pub fn push(&mut self, mut entry: MetadataEntry) -> MetadataEntry {
        entry.seq = self.next_seq;
        self.next_seq += 1;
        self.entries.push(entry.clone());
        entry
    }

    pub fn remove(&mut self, key: &str) -> Option<MetadataEntry> {
        let pos = self.entries.iter().position(|e| e.key == key)?;
        Some(self.entries.remove(pos))
    }

    /// Put a removed entry back (rollback path), keeping its original seq.
    pub(crate) fn restore_entry(&mut self, entry: MetadataEntry) {
        self.entries.push(entry);
    }

    pub fn get(&self, key: &str) -> Option<&MetadataEntry> {
        self.entries.iter().find(|e| e.key == key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn entries(&self) -> &[MetadataEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn count(&self, tier: Tier) -> usize {
        self.entries.iter().filter(|e| e.tier == tier).count()
    }

    pub fn total_size(&self) -> u64 {
        self.entries.iter().map(|e| e.size).sum()
    }

    /// Entries of one tier, oldest first (timestamp, then insertion order).
    pub fn oldest_first(&self, tier: Tier) -> Vec<&MetadataEntry> {
        let mut v: Vec<&MetadataEntry> = self.entries.iter().filter(|e| e.tier == tier).collect();
        v.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then(a.seq.cmp(&b.seq)));
        v
    }

    /// Listing view: newest first, optionally restricted to one tier.
    pub fn list(&self, tier: Option<Tier>) -> Vec<MetadataEntry> {
        let mut v: Vec<MetadataEntry> = self
            .entries
            .iter()
            .filter(|e| tier.map(|t| e.tier == t).unwrap_or(true))
            .cloned()
            .collect();
        v.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.seq.cmp(&a.seq)));
        v
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemStore;

    fn entry(key: &str, tier: Tier, ts: u64) -> MetadataEntry {
        MetadataEntry {
            key: key.to_string(),
            tier,
            timestamp: ts,
            description: String::new(),
            size: 10,
            seq: 0,
            sha256: None,
        }
    }

    #[test]
    fn equal_timestamps_order_by_insertion() {
        let mut idx = MetadataIndex::new();
        idx.push(entry("b", Tier::Auto, 100));
        idx.push(entry("a", Tier::Auto, 100));
        idx.push(entry("c", Tier::Auto, 50));
        let keys: Vec<&str> = idx.oldest_first(Tier::Auto).iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["c", "b", "a"]);
        let listed: Vec<String> = idx.list(None).into_iter().map(|e| e.key).collect();
        assert_eq!(listed, vec!["a", "b", "c"]);
    }

    #[test]
    fn persists_through_store() {
        let store = MemStore::new(1 << 20);
        let mut idx = MetadataIndex::new();
        idx.push(entry("k1", Tier::Manual, 1));
        idx.push(entry("k2", Tier::Imported, 2));
        idx.save(&store).unwrap();

        let mut back = MetadataIndex::load(&store).unwrap();
        assert_eq!(back.len(), 2);
        assert_eq!(back.count(Tier::Manual), 1);
        // sequence continues after reload
        let e = back.push(entry("k3", Tier::Auto, 3));
        assert_eq!(e.seq, 2);
    }

    #[test]
    fn missing_index_loads_empty() {
        let store = MemStore::new(1024);
        assert!(MetadataIndex::load(&store).unwrap().is_empty());
    }

    #[test]
    fn list_filters_by_tier() {
        let mut idx = MetadataIndex::new();
        idx.push(entry("a", Tier::Auto, 1));
        idx.push(entry("m", Tier::Manual, 2));
        let only: Vec<String> = idx.list(Some(Tier::Manual)).into_iter().map(|e| e.key).collect();
        assert_eq!(only, vec!["m"]);
    }
}
