//! Advisory lock on a store directory (fs2).
//!
//! One `DirStore` per directory per machine: the lock is taken when the store is
//! opened and released on Drop.
//!
//! Lock file path: <store_dir>/LOCK

use anyhow::{Context, Result};
use fs2::FileExt;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use crate::consts::STORE_LOCK_FILE;

pub struct StoreLock {
    file: std::fs::File,
    path: PathBuf,
}

impl StoreLock {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}

fn lock_file_path(dir: &Path) -> PathBuf {
    dir.join(STORE_LOCK_FILE)
}

fn open_lock_file(dir: &Path) -> Result<std::fs::File> {
    let path = lock_file_path(dir);
    OpenOptions::new()
        .create(true)
        .read(true)
        .write(true)
        .open(&path)
        .with_context(|| format!("open lock file {}", path.display()))
}

/// Try to take the exclusive store lock. Returns Err if another holder exists.
pub fn try_lock_store(dir: &Path) -> Result<StoreLock> {
    let file = open_lock_file(dir)?;
    let path = lock_file_path(dir);
    file.try_lock_exclusive().with_context(|| {
        format!(
            "store {} is locked by another process ({})",
            dir.display(),
            path.display()
        )
    })?;
    Ok(StoreLock { file, path })
}
