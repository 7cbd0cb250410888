use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use crate::engine::SnapshotEngine;
use crate::error::Result;
use crate::tier::Tier;
use crate::util::{human_size, rfc3339_utc};

/// Summary of the snapshot store, computed from the metadata index.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub total_snapshots: usize,
    pub total_size_bytes: u64,
    pub total_size_human: String,
    /// Every tier appears, with 0 for empty tiers.
    pub per_tier_counts: BTreeMap<Tier, usize>,
    pub last_manual_backup_time: Option<u64>,
    pub next_auto_backup_eta_ms: Option<u64>,
}

pub fn collect(engine: &SnapshotEngine, next_auto_eta_ms: Option<u64>) -> Result<Stats> {
    let index = engine.index_read()?;
    let per_tier_counts = Tier::ALL
        .iter()
        .map(|t| (*t, index.count(*t)))
        .collect();
    let total_size_bytes = index.total_size();
    Ok(Stats {
        total_snapshots: index.len(),
        total_size_bytes,
        total_size_human: human_size(total_size_bytes),
        per_tier_counts,
        last_manual_backup_time: engine.last_manual_backup_ms(),
        next_auto_backup_eta_ms: next_auto_eta_ms,
    })
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "snapshots:   {} ({})",
            self.total_snapshots, self.total_size_human
        )?;
        for (tier, n) in &self.per_tier_counts {
            writeln!(f, "  {:<9} {}", tier.as_str(), n)?;
        }
        match self.last_manual_backup_time {
            Some(ts) => writeln!(f, "last manual: {}", rfc3339_utc(ts))?,
            None => writeln!(f, "last manual: never")?,
        }
        match self.next_auto_backup_eta_ms {
            Some(ms) => write!(f, "next auto:   in {} s", ms / 1000),
            None => write!(f, "next auto:   scheduler not running"),
        }
    }
}
