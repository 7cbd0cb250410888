//! Export/import gateway.
//!
//! Export hands out the stored record bytes unchanged. Import admits an external
//! artifact only after the same validation restore uses, then re-frames it as an
//! `Imported` record (import time, original description or "imported") around the
//! untouched payload text. Imported records are exempt from retention.

use anyhow::Context;
use log::{info, warn};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::engine::SnapshotEngine;
use crate::error::{Result, SnapshotError};
use crate::index::MetadataEntry;
use crate::metrics::{record_export, record_import};
use crate::record::SnapshotRecord;
use crate::util::{compact_utc, now_ms};
use crate::validate::validate;

/// Stored bytes of snapshot `key`, byte-identical to what capture wrote.
pub fn export(engine: &SnapshotEngine, key: &str) -> Result<Vec<u8>> {
    let bytes = engine.read_backup(key)?;
    record_export();
    info!("export: key={} ({} B)", key, bytes.len());
    Ok(bytes)
}

/// `snapshot-<tier>-<YYYYMMDD-HHMMSS>.json`, UTC.
pub fn default_export_filename(entry: &MetadataEntry) -> String {
    format!(
        "snapshot-{}-{}.json",
        entry.tier.as_str(),
        compact_utc(entry.timestamp)
    )
}

/// Export `key` to disk. A directory `dest` gets the default file name inside it.
/// Returns the written path.
pub fn export_to_path(engine: &SnapshotEngine, key: &str, dest: &Path) -> Result<PathBuf> {
    let path = if dest.is_dir() {
        let entry = engine
            .entry(key)?
            .ok_or_else(|| SnapshotError::not_found(key))?;
        dest.join(default_export_filename(&entry))
    } else {
        dest.to_path_buf()
    };
    let bytes = export(engine, key)?;

    let mut tmp_os = path.as_os_str().to_owned();
    tmp_os.push(".tmp");
    let tmp = PathBuf::from(tmp_os);
    {
        let mut f = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&tmp)
            .with_context(|| format!("open {}", tmp.display()))?;
        f.write_all(&bytes)
            .with_context(|| format!("write {}", tmp.display()))?;
        f.sync_all()
            .with_context(|| format!("fsync {}", tmp.display()))?;
    }
    fs::rename(&tmp, &path)
        .with_context(|| format!("rename {} -> {}", tmp.display(), path.display()))?;
    Ok(path)
}

/// Admit an external artifact as a new `Imported` snapshot; returns its entry.
pub fn import(engine: &SnapshotEngine, artifact: &[u8]) -> Result<MetadataEntry> {
    let guard = engine.try_begin()?;

    let res = validate(artifact)
        .and_then(|_| SnapshotRecord::imported_from(artifact, now_ms()))
        .and_then(|record| engine.admit(&guard, &record));
    record_import(res.is_ok());
    match &res {
        Ok(e) => info!("import: key={} ({} B)", e.key, e.size),
        Err(e) => warn!("import: rejected: {}", e),
    }
    res
}

/// Read and import an artifact file.
pub fn import_file(engine: &SnapshotEngine, path: &Path) -> Result<MetadataEntry> {
    let bytes = match fs::read(path) {
        Ok(b) => b,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(SnapshotError::not_found(path.display().to_string()))
        }
        Err(e) => {
            return Err(SnapshotError::Storage(
                anyhow::Error::new(e).context(format!("read {}", path.display())),
            ))
        }
    };
    import(engine, &bytes)
}
