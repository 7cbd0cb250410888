//! Lightweight global metrics.
//!
//! Process-wide atomic counters for the snapshot subsystem:
//! - captures (ok / busy / too large / no project)
//! - retention evictions
//! - restores, imports, exports, deletes

use std::sync::atomic::{AtomicU64, Ordering};

// ----- Capture -----
static CAPTURES_TOTAL: AtomicU64 = AtomicU64::new(0);
static CAPTURE_BYTES_WRITTEN: AtomicU64 = AtomicU64::new(0);
static CAPTURES_BUSY: AtomicU64 = AtomicU64::new(0);
static CAPTURES_TOO_LARGE: AtomicU64 = AtomicU64::new(0);
static CAPTURES_NO_PROJECT: AtomicU64 = AtomicU64::new(0);

// ----- Retention -----
static EVICTIONS_TOTAL: AtomicU64 = AtomicU64::new(0);

// ----- Restore / gateway -----
static RESTORES_TOTAL: AtomicU64 = AtomicU64::new(0);
static RESTORES_REJECTED: AtomicU64 = AtomicU64::new(0);
static IMPORTS_TOTAL: AtomicU64 = AtomicU64::new(0);
static IMPORTS_REJECTED: AtomicU64 = AtomicU64::new(0);
static EXPORTS_TOTAL: AtomicU64 = AtomicU64::new(0);
static DELETES_TOTAL: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone, Default)]
pub struct MetricsSnapshot {
    pub captures_total: u64,
    pub capture_bytes_written: u64,
    pub captures_busy: u64,
    pub captures_too_large: u64,
    pub captures_no_project: u64,

    pub evictions_total: u64,

    pub restores_total: u64,
    pub restores_rejected: u64,
    pub imports_total: u64,
    pub imports_rejected: u64,
    pub exports_total: u64,
    pub deletes_total: u64,
}

impl MetricsSnapshot {
    pub fn avg_capture_bytes(&self) -> f64 {
        if self.captures_total == 0 {
            0.0
        } else {
            self.capture_bytes_written as f64 / self.captures_total as f64
        }
    }
}

// ----- Recorders -----
pub fn record_capture(bytes: usize) {
    CAPTURES_TOTAL.fetch_add(1, Ordering::Relaxed);
    CAPTURE_BYTES_WRITTEN.fetch_add(bytes as u64, Ordering::Relaxed);
}

pub fn record_capture_busy() {
    CAPTURES_BUSY.fetch_add(1, Ordering::Relaxed);
}

pub fn record_capture_too_large() {
    CAPTURES_TOO_LARGE.fetch_add(1, Ordering::Relaxed);
}

pub fn record_capture_no_project() {
    CAPTURES_NO_PROJECT.fetch_add(1, Ordering::Relaxed);
}

pub fn record_evictions(n: usize) {
    EVICTIONS_TOTAL.fetch_add(n as u64, Ordering::Relaxed);
}

pub fn record_restore(ok: bool) {
    if ok {
        RESTORES_TOTAL.fetch_add(1, Ordering::Relaxed);
    } else {
        RESTORES_REJECTED.fetch_add(1, Ordering::Relaxed);
    }
}

pub fn record_import(ok: bool) {
    if ok {
        IMPORTS_TOTAL.fetch_add(1, Ordering::Relaxed);
    } else {
        IMPORTS_REJECTED.fetch_add(1, Ordering::Relaxed);
    }
}

pub fn record_export() {
    EXPORTS_TOTAL.fetch_add(1, Ordering::Relaxed);
}

pub fn record_delete() {
    DELETES_TOTAL.fetch_add(1, Ordering::Relaxed);
}

// ----- Snapshot -----
pub fn snapshot() -> MetricsSnapshot {
    MetricsSnapshot {
        captures_total: CAPTURES_TOTAL.load(Ordering::Relaxed),
        capture_bytes_written: CAPTURE_BYTES_WRITTEN.load(Ordering::Relaxed),
        captures_busy: CAPTURES_BUSY.load(Ordering::Relaxed),
        captures_too_large: CAPTURES_TOO_LARGE.load(Ordering::Relaxed),
        captures_no_project: CAPTURES_NO_PROJECT.load(Ordering::Relaxed),

        evictions_total: EVICTIONS_TOTAL.load(Ordering::Relaxed),

        restores_total: RESTORES_TOTAL.load(Ordering::Relaxed),
        restores_rejected: RESTORES_REJECTED.load(Ordering::Relaxed),
        imports_total: IMPORTS_TOTAL.load(Ordering::Relaxed),
        imports_rejected: IMPORTS_REJECTED.load(Ordering::Relaxed),
        exports_total: EXPORTS_TOTAL.load(Ordering::Relaxed),
        deletes_total: DELETES_TOTAL.load(Ordering::Relaxed),
    }
}
