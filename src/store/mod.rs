//! store — the persistent key -> blob mapping behind snapshots.
//!
//! Backends:
//! - DirStore: one file per key under a directory (tmp+fsync+rename, fs2 lock).
//! - MemStore: in-process map for tests and embedding.
//!
//! Contract shared by all backends:
//! - `put` rejects blobs above the backend's size limit with `TooLarge` before
//!   anything is written; there are no partial writes.
//! - `put_meta` writes bookkeeping records (`meta_*`) without the size limit, which
//!   only bounds snapshot records.
//! - `get` of an absent key is `NotFound`; `delete` of an absent key is Ok.
//! - `list_keys` has no ordering guarantee (ordering is the metadata index's job).
//! - keys are `[A-Za-z0-9_.-]`, 1..=128 chars, not starting with '.'.

use crate::consts::MAX_KEY_LEN;
use crate::error::{Result, SnapshotError};

mod dir;
mod mem;

pub use dir::DirStore;
pub use mem::MemStore;

pub trait SnapshotStore: Send + Sync {
    /// Store `blob` under `key`, replacing any previous value.
    fn put(&self, key: &str, blob: &[u8]) -> Result<()>;

    /// Store a bookkeeping record (index, markers). Not subject to `max_blob_bytes`.
    fn put_meta(&self, key: &str, blob: &[u8]) -> Result<()>;

    /// Read the blob stored under `key`.
    fn get(&self, key: &str) -> Result<Vec<u8>>;

    /// Remove `key`. Absent keys are not an error.
    fn delete(&self, key: &str) -> Result<()>;

    /// All keys currently stored, in no particular order.
    fn list_keys(&self) -> Result<Vec<String>>;

    fn contains(&self, key: &str) -> Result<bool> {
        match self.get(key) {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Largest blob `put` accepts.
    fn max_blob_bytes(&self) -> u64;
}

pub(crate) fn check_key(key: &str) -> Result<()> {
    let ok = !key.is_empty()
        && key.len() <= MAX_KEY_LEN
        && !key.starts_with('.')
        && key
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-' || b == b'.');
    if ok {
        Ok(())
    } else {
        Err(SnapshotError::invalid_key(key))
    }
}

pub(crate) fn check_size(len: usize, limit: u64) -> Result<()> {
    let len = len as u64;
    if len > limit {
        Err(SnapshotError::too_large(len, limit))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_alphabet() {
        assert!(check_key("backup_manual_1700000000000_deadbeef").is_ok());
        assert!(check_key("meta_index").is_ok());
        assert!(check_key("").is_err());
        assert!(check_key("../etc/passwd").is_err());
        assert!(check_key(".hidden").is_err());
        assert!(check_key("a/b").is_err());
        assert!(check_key(&"k".repeat(MAX_KEY_LEN + 1)).is_err());
    }

    #[test]
    fn size_gate_is_inclusive() {
        assert!(check_size(10, 10).is_ok());
        let e = check_size(11, 10).unwrap_err();
        assert!(e.is_too_large());
    }

    #[test]
    fn mem_store_checks_keys_on_every_access() {
        let store = MemStore::new(16);
        assert!(store.get("../x").unwrap_err().is_invalid_key());
        assert!(store.delete("a/b").unwrap_err().is_invalid_key());
        assert!(store.put_meta("", b"x").unwrap_err().is_invalid_key());
    }

    #[test]
    fn meta_records_skip_the_size_limit() {
        let store = MemStore::new(4);
        assert!(store.put("backup_a", b"12345").unwrap_err().is_too_large());
        store.put_meta("meta_index", b"0123456789").unwrap();
        assert_eq!(store.get("meta_index").unwrap().len(), 10);
    }
}
