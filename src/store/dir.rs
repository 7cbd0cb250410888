//! DirStore — file-per-key SnapshotStore.
//!
//! Layout:
//!   <dir>/<key>.snap      — blob
//!   <dir>/<key>.snap.tmp  — in-flight write (renamed over the blob on success)
//!   <dir>/LOCK            — fs2 exclusive lock held while the store is open
//!
//! Writes go through tmp + fsync + rename, so a reader never sees a half-written blob.
//! Leftover *.tmp files (crash mid-write) are ignored by list_keys and removed on open.

use anyhow::Context;
use log::{debug, warn};
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use super::{check_key, check_size, SnapshotStore};
use crate::consts::STORE_FILE_EXT;
use crate::error::{Result, SnapshotError};
use crate::lock::{try_lock_store, StoreLock};

pub struct DirStore {
    dir: PathBuf,
    max_blob_bytes: u64,
    _lock: StoreLock,
}

impl DirStore {
    /// Open or create a store directory and take its lock.
    pub fn open_or_create(dir: &Path, max_blob_bytes: u64) -> Result<Self> {
        if !dir.exists() {
            fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
        }
        let lock = try_lock_store(dir)?;
        debug!("store: opened {} (lock {})", dir.display(), lock.path().display());
        let store = Self {
            dir: dir.to_path_buf(),
            max_blob_bytes,
            _lock: lock,
        };
        store.remove_stale_tmp();
        Ok(store)
    }

    pub fn dir_path(&self) -> &Path {
        &self.dir
    }

    fn blob_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.{STORE_FILE_EXT}"))
    }

    fn write_atomic(&self, key: &str, blob: &[u8]) -> Result<()> {
        let path = self.blob_path(key);
        let tmp = path.with_extension(format!("{STORE_FILE_EXT}.tmp"));
        {
            let mut f = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(&tmp)
                .with_context(|| format!("open tmp {}", tmp.display()))?;
            f.write_all(blob)
                .with_context(|| format!("write {}", tmp.display()))?;
            f.sync_all()
                .with_context(|| format!("fsync {}", tmp.display()))?;
        }
        fs::rename(&tmp, &path)
            .with_context(|| format!("rename {} -> {}", tmp.display(), path.display()))?;
        Ok(())
    }

    fn remove_stale_tmp(&self) {
        let rd = match fs::read_dir(&self.dir) {
            Ok(rd) => rd,
            Err(_) => return,
        };
        for e in rd.flatten() {
            let p = e.path();
            if p.extension().map(|ext| ext == "tmp").unwrap_or(false) {
                debug!("store: removing stale tmp {}", p.display());
                if let Err(err) = fs::remove_file(&p) {
                    warn!("store: cannot remove stale tmp {}: {}", p.display(), err);
                }
            }
        }
    }
}

impl SnapshotStore for DirStore {
    fn put(&self, key: &str, blob: &[u8]) -> Result<()> {
        check_key(key)?;
        check_size(blob.len(), self.max_blob_bytes)?;
        self.write_atomic(key, blob)
    }

    fn put_meta(&self, key: &str, blob: &[u8]) -> Result<()> {
        check_key(key)?;
        self.write_atomic(key, blob)
    }

    fn get(&self, key: &str) -> Result<Vec<u8>> {
        check_key(key)?;
        let path = self.blob_path(key);
        match fs::read(&path) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(SnapshotError::not_found(key)),
            Err(e) => Err(anyhow::Error::new(e)
                .context(format!("read {}", path.display()))
                .into()),
        }
    }

    fn delete(&self, key: &str) -> Result<()> {
        check_key(key)?;
        let path = self.blob_path(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(anyhow::Error::new(e)
                .context(format!("remove {}", path.display()))
                .into()),
        }
    }

    fn list_keys(&self) -> Result<Vec<String>> {
        let mut out = Vec::new();
        for e in fs::read_dir(&self.dir).with_context(|| format!("read_dir {}", self.dir.display()))? {
            let p = e.with_context(|| format!("read_dir entry in {}", self.dir.display()))?.path();
            if p.extension().map(|ext| ext == STORE_FILE_EXT).unwrap_or(false) {
                if let Some(stem) = p.file_stem().and_then(|s| s.to_str()) {
                    out.push(stem.to_string());
                }
            }
        }
        Ok(out)
    }

    fn contains(&self, key: &str) -> Result<bool> {
        check_key(key)?;
        Ok(self.blob_path(key).is_file())
    }

    fn max_blob_bytes(&self) -> u64 {
        self.max_blob_bytes
    }
}
