//! Integrity scan over the index and the store. Read-only; never repairs.
//!
//! Per indexed entry:
//! - payload missing             -> "missing payload"
//! - stored size != entry.size   -> "size mismatch"
//! - sha256 != entry.sha256      -> "checksum mismatch" (entries without a digest skip this)
//! - validator rejects the blob  -> "malformed: <reason>"
//! Store-wide:
//! - `backup_*` keys with no index entry -> "orphan"

use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

use crate::consts::BACKUP_KEY_PREFIX;
use crate::engine::SnapshotEngine;
use crate::error::Result;
use crate::util::sha256_hex;
use crate::validate::validate;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrityIssue {
    pub key: String,
    pub problem: String,
}

impl fmt::Display for IntegrityIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.key, self.problem)
    }
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrityReport {
    pub is_valid: bool,
    pub checked: usize,
    pub issues: Vec<IntegrityIssue>,
}

impl IntegrityReport {
    fn push(&mut self, key: &str, problem: impl Into<String>) {
        self.issues.push(IntegrityIssue {
            key: key.to_string(),
            problem: problem.into(),
        });
    }

    pub fn orphans(&self) -> impl Iterator<Item = &IntegrityIssue> {
        self.issues.iter().filter(|i| i.problem == "orphan")
    }
}

pub fn check(engine: &SnapshotEngine) -> Result<IntegrityReport> {
    let index = engine.index_read()?;
    let store = engine.store();
    let mut report = IntegrityReport::default();

    for entry in index.entries() {
        report.checked += 1;
        let blob = match store.get(&entry.key) {
            Ok(b) => b,
            Err(e) if e.is_not_found() => {
                report.push(&entry.key, "missing payload");
                continue;
            }
            Err(e) => {
                report.push(&entry.key, format!("unreadable: {}", e));
                continue;
            }
        };
        if blob.len() as u64 != entry.size {
            report.push(
                &entry.key,
                format!("size mismatch: indexed {} B, stored {} B", entry.size, blob.len()),
            );
        }
        if let Some(want) = &entry.sha256 {
            if *want != sha256_hex(&blob) {
                report.push(&entry.key, "checksum mismatch");
            }
        }
        if let Err(e) = validate(&blob) {
            report.push(&entry.key, format!("{}", e));
        }
    }

    let indexed: HashSet<&str> = index.entries().iter().map(|e| e.key.as_str()).collect();
    let mut orphans: Vec<String> = store
        .list_keys()?
        .into_iter()
        .filter(|k| k.starts_with(BACKUP_KEY_PREFIX) && !indexed.contains(k.as_str()))
        .collect();
    orphans.sort();
    for k in orphans {
        report.push(&k, "orphan");
    }

    report.is_valid = report.issues.is_empty();
    Ok(report)
}
