//! Scheduler — two periodic capture tasks (auto, safety).
//!
//! Each task is a named thread blocked on `recv_timeout(interval)` of its own stop
//! channel: a timeout is a tick, a message or a dropped sender ends the loop. Ticks
//! call the same `capture(tier, None)` entry point as manual callers.
//!
//! Tick outcomes:
//! - Busy            -> dropped, debug log (next tick retries on schedule)
//! - NoActiveProject -> no-op
//! - other errors    -> warn log, swallowed
//!
//! An interval of 0 disables that tier's task.

use log::{debug, info, warn};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::config::SnapConfig;
use crate::engine::{CaptureOutcome, SnapshotEngine};
use crate::error::{Result, SnapshotError};
use crate::tier::Tier;
use crate::util::now_ms;

struct PeriodicTask {
    tier: Tier,
    stop_tx: Sender<()>,
    handle: JoinHandle<()>,
}

impl PeriodicTask {
    fn spawn(
        engine: Arc<SnapshotEngine>,
        tier: Tier,
        interval: Duration,
        next_due: Arc<AtomicU64>,
    ) -> Result<Self> {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let interval_ms = interval.as_millis() as u64;
        next_due.store(now_ms() + interval_ms, Ordering::Relaxed);

        let handle = thread::Builder::new()
            .name(format!("snapkeep-{}", tier))
            .spawn(move || loop {
                match stop_rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => {
                        next_due.store(now_ms() + interval_ms, Ordering::Relaxed);
                        tick(&engine, tier);
                    }
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            })
            .map_err(|e| {
                SnapshotError::Storage(
                    anyhow::Error::new(e).context(format!("spawn {} scheduler thread", tier)),
                )
            })?;

        Ok(Self {
            tier,
            stop_tx,
            handle,
        })
    }

    fn stop(self) {
        let _ = self.stop_tx.send(());
        if self.handle.join().is_err() {
            warn!("scheduler: {} task panicked", self.tier);
        }
    }
}

fn tick(engine: &SnapshotEngine, tier: Tier) {
    match engine.capture(tier, None) {
        Ok(CaptureOutcome::Captured(e)) => debug!("scheduler: {} tick -> {}", tier, e.key),
        Ok(CaptureOutcome::NoActiveProject) => {}
        Err(SnapshotError::Busy) => debug!("scheduler: {} tick dropped, engine busy", tier),
        Err(e) => warn!("scheduler: {} capture failed: {}", tier, e),
    }
}

pub struct Scheduler {
    engine: Arc<SnapshotEngine>,
    auto_interval: Option<Duration>,
    safety_interval: Option<Duration>,
    tasks: Mutex<Vec<PeriodicTask>>,
    // unix ms of the next auto tick; 0 while the auto task is not running
    next_auto_due: Arc<AtomicU64>,
}

impl Scheduler {
    pub fn new(engine: Arc<SnapshotEngine>, cfg: &SnapConfig) -> Self {
        Self {
            engine,
            auto_interval: cfg.interval(Tier::Auto),
            safety_interval: cfg.interval(Tier::Safety),
            tasks: Mutex::new(Vec::new()),
            next_auto_due: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Start both tasks. No-op when already running.
    pub fn start(&self) -> Result<()> {
        let mut tasks = self.lock_tasks();
        if !tasks.is_empty() {
            return Ok(());
        }
        let plan = [
            (Tier::Auto, self.auto_interval),
            (Tier::Safety, self.safety_interval),
        ];
        for (tier, interval) in plan {
            let Some(interval) = interval else {
                debug!("scheduler: {} task disabled", tier);
                continue;
            };
            let due = if tier == Tier::Auto {
                self.next_auto_due.clone()
            } else {
                Arc::new(AtomicU64::new(0))
            };
            match PeriodicTask::spawn(self.engine.clone(), tier, interval, due) {
                Ok(t) => tasks.push(t),
                Err(e) => {
                    for t in tasks.drain(..) {
                        t.stop();
                    }
                    self.next_auto_due.store(0, Ordering::Relaxed);
                    return Err(e);
                }
            }
            info!("scheduler: {} every {} ms", tier, interval.as_millis());
        }
        Ok(())
    }

    /// Stop and join both tasks. No-op when not running.
    pub fn stop(&self) {
        let tasks: Vec<PeriodicTask> = self.lock_tasks().drain(..).collect();
        if tasks.is_empty() {
            return;
        }
        for t in tasks {
            t.stop();
        }
        self.next_auto_due.store(0, Ordering::Relaxed);
        info!("scheduler: stopped");
    }

    pub fn is_running(&self) -> bool {
        !self.lock_tasks().is_empty()
    }

    /// Milliseconds until the next auto tick, if the auto task is running.
    pub fn next_auto_eta_ms(&self) -> Option<u64> {
        match self.next_auto_due.load(Ordering::Relaxed) {
            0 => None,
            due => Some(due.saturating_sub(now_ms())),
        }
    }

    fn lock_tasks(&self) -> std::sync::MutexGuard<'_, Vec<PeriodicTask>> {
        // a panic while holding this lock cannot leave the Vec inconsistent
        self.tasks.lock().unwrap_or_else(|p| p.into_inner())
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.stop();
    }
}
