//! In-memory SnapshotStore.

use std::collections::HashMap;
use std::sync::RwLock;

use anyhow::anyhow;

use super::{check_key, check_size, SnapshotStore};
use crate::error::{Result, SnapshotError};

pub struct MemStore {
    map: RwLock<HashMap<String, Vec<u8>>>,
    max_blob_bytes: u64,
}

impl MemStore {
    pub fn new(max_blob_bytes: u64) -> Self {
        Self {
            map: RwLock::new(HashMap::new()),
            max_blob_bytes,
        }
    }

    /// Overwrite a blob without any checks. Lets tests simulate on-disk corruption.
    pub fn put_unchecked(&self, key: &str, blob: &[u8]) {
        if let Ok(mut g) = self.map.write() {
            g.insert(key.to_string(), blob.to_vec());
        }
    }

    pub fn len(&self) -> usize {
        self.map.read().map(|g| g.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned() -> SnapshotError {
    SnapshotError::Storage(anyhow!("memory store lock poisoned"))
}

impl SnapshotStore for MemStore {
    fn put(&self, key: &str, blob: &[u8]) -> Result<()> {
        check_key(key)?;
        check_size(blob.len(), self.max_blob_bytes)?;
        let mut g = self.map.write().map_err(|_| poisoned())?;
        g.insert(key.to_string(), blob.to_vec());
        Ok(())
    }

    fn put_meta(&self, key: &str, blob: &[u8]) -> Result<()> {
        check_key(key)?;
        let mut g = self.map.write().map_err(|_| poisoned())?;
        g.insert(key.to_string(), blob.to_vec());
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Vec<u8>> {
        check_key(key)?;
        let g = self.map.read().map_err(|_| poisoned())?;
        g.get(key)
            .cloned()
            .ok_or_else(|| SnapshotError::not_found(key))
    }

    fn delete(&self, key: &str) -> Result<()> {
        check_key(key)?;
        let mut g = self.map.write().map_err(|_| poisoned())?;
        g.remove(key);
        Ok(())
    }

    fn list_keys(&self) -> Result<Vec<String>> {
        let g = self.map.read().map_err(|_| poisoned())?;
        Ok(g.keys().cloned().collect())
    }

    fn contains(&self, key: &str) -> Result<bool> {
        let g = self.map.read().map_err(|_| poisoned())?;
        Ok(g.contains_key(key))
    }

    fn max_blob_bytes(&self) -> u64 {
        self.max_blob_bytes
    }
}
