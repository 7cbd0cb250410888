use anyhow::Result;
use serde_json::json;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use snapkeep::{
    CaptureOutcome, MemStore, MemoryState, ProjectState, SnapConfig, SnapshotManager,
    SnapshotStore, Tier,
};

/// Producer that parks inside `snapshot()` until released, holding the write guard.
struct GatedProducer {
    entered: Mutex<Sender<()>>,
    release: Mutex<Receiver<()>>,
}

impl snapkeep::StateProducer for GatedProducer {
    fn snapshot(&self) -> snapkeep::Result<Option<ProjectState>> {
        if let Ok(tx) = self.entered.lock() {
            let _ = tx.send(());
        }
        if let Ok(rx) = self.release.lock() {
            let _ = rx.recv_timeout(Duration::from_secs(10));
        }
        Ok(Some(ProjectState::new(json!({"id": "p"}), json!([]))))
    }
}

/// Store whose snapshot writes park until released. Bookkeeping writes pass through.
struct GatedStore {
    inner: MemStore,
    entered: Mutex<Sender<()>>,
    release: Mutex<Receiver<()>>,
}

impl SnapshotStore for GatedStore {
    fn put(&self, key: &str, blob: &[u8]) -> snapkeep::Result<()> {
        if key.starts_with("backup_") {
            if let Ok(tx) = self.entered.lock() {
                let _ = tx.send(());
            }
            if let Ok(rx) = self.release.lock() {
                let _ = rx.recv_timeout(Duration::from_secs(10));
            }
        }
        self.inner.put(key, blob)
    }

    fn put_meta(&self, key: &str, blob: &[u8]) -> snapkeep::Result<()> {
        self.inner.put_meta(key, blob)
    }

    fn get(&self, key: &str) -> snapkeep::Result<Vec<u8>> {
        self.inner.get(key)
    }

    fn delete(&self, key: &str) -> snapkeep::Result<()> {
        self.inner.delete(key)
    }

    fn list_keys(&self) -> snapkeep::Result<Vec<String>> {
        self.inner.list_keys()
    }

    fn max_blob_bytes(&self) -> u64 {
        self.inner.max_blob_bytes()
    }
}

#[test]
fn second_writer_observes_busy() -> Result<()> {
    let (entered_tx, entered_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel();
    let producer = Arc::new(GatedProducer {
        entered: Mutex::new(entered_tx),
        release: Mutex::new(release_rx),
    });
    let consumer = Arc::new(MemoryState::default());
    let store = Arc::new(MemStore::new(1 << 20));
    let cfg = SnapConfig::default().with_scheduler_enabled(false);
    let mgr = Arc::new(SnapshotManager::new(store, producer, consumer, cfg)?);

    let first = {
        let mgr = mgr.clone();
        thread::spawn(move || mgr.create_manual_snapshot("first"))
    };
    entered_rx.recv_timeout(Duration::from_secs(10))?;

    // every write path is refused while the first capture is in flight
    assert!(mgr.create_manual_snapshot("second").unwrap_err().is_busy());
    assert!(mgr.capture(Tier::Auto).unwrap_err().is_busy());
    assert!(mgr.restore_snapshot("backup_manual_1_00000000").unwrap_err().is_busy());
    assert!(mgr.cleanup().unwrap_err().is_busy());
    assert!(mgr.engine().is_busy());

    // reads are not blocked
    assert!(mgr.list_snapshots(None)?.is_empty());
    assert!(mgr.get_stats().is_ok());

    release_tx.send(())?;
    let outcome = first.join().map_err(|_| anyhow::anyhow!("capture thread panicked"))??;
    assert!(matches!(outcome, CaptureOutcome::Captured(_)));
    assert!(!mgr.engine().is_busy());
    assert_eq!(mgr.list_snapshots(None)?.len(), 1);
    Ok(())
}

#[test]
fn reads_proceed_while_payload_write_is_in_flight() -> Result<()> {
    let (entered_tx, entered_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel();
    let store = Arc::new(GatedStore {
        inner: MemStore::new(1 << 20),
        entered: Mutex::new(entered_tx),
        release: Mutex::new(release_rx),
    });
    let live = Arc::new(MemoryState::new(Some(ProjectState::new(
        json!({"id": "p"}),
        json!([]),
    ))));
    let cfg = SnapConfig::default().with_scheduler_enabled(false);
    let mgr = Arc::new(SnapshotManager::new(store, live.clone(), live, cfg)?);

    let first = {
        let mgr = mgr.clone();
        thread::spawn(move || mgr.create_manual_snapshot("slow disk"))
    };
    entered_rx.recv_timeout(Duration::from_secs(10))?;

    // answered from the index while the payload is still being written
    let (done_tx, done_rx) = mpsc::channel();
    {
        let mgr = mgr.clone();
        thread::spawn(move || {
            let listed = mgr.list_snapshots(None).map(|l| l.len());
            let stats = mgr.get_stats().map(|s| s.total_snapshots);
            let valid = mgr.check_integrity().map(|r| r.is_valid);
            let _ = done_tx.send((listed.ok(), stats.ok(), valid.ok()));
        });
    }
    let reads = done_rx.recv_timeout(Duration::from_secs(5));
    release_tx.send(())?;
    assert_eq!(reads?, (Some(0), Some(0), Some(true)));

    let outcome = first.join().map_err(|_| anyhow::anyhow!("capture thread panicked"))??;
    assert!(matches!(outcome, CaptureOutcome::Captured(_)));
    assert_eq!(mgr.list_snapshots(None)?.len(), 1);
    assert!(mgr.check_integrity()?.is_valid);
    Ok(())
}

#[test]
fn racing_captures_never_double_write() -> Result<()> {
    let live = Arc::new(MemoryState::new(Some(ProjectState::new(
        json!({"id": "p"}),
        json!([{"id": "v"}]),
    ))));
    let store = Arc::new(MemStore::new(1 << 20));
    let cfg = SnapConfig::default()
        .with_scheduler_enabled(false)
        .with_max_manual_backups(1000);
    let mgr = Arc::new(SnapshotManager::new(store, live.clone(), live, cfg)?);

    let mut handles = Vec::new();
    for t in 0..8 {
        let mgr = mgr.clone();
        handles.push(thread::spawn(move || {
            let mut ok = 0usize;
            let mut busy = 0usize;
            for i in 0..25 {
                match mgr.create_manual_snapshot(&format!("t{t}-{i}")) {
                    Ok(CaptureOutcome::Captured(_)) => ok += 1,
                    Err(e) if e.is_busy() => busy += 1,
                    other => panic!("unexpected outcome: {:?}", other),
                }
            }
            (ok, busy)
        }));
    }
    let mut ok_total = 0;
    for h in handles {
        let (ok, busy) = h.join().map_err(|_| anyhow::anyhow!("worker panicked"))?;
        assert_eq!(ok + busy, 25);
        ok_total += ok;
    }

    // every success is exactly one indexed record, nothing else was written
    assert!(ok_total >= 1);
    assert_eq!(mgr.list_snapshots(None)?.len(), ok_total);
    assert!(mgr.check_integrity()?.is_valid);
    Ok(())
}
