use anyhow::Result;
use serde_json::json;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use snapkeep::{MemStore, MemoryState, ProjectState, SnapConfig, SnapshotManager, Tier};

fn manager(cfg: SnapConfig, live: Arc<MemoryState>) -> Result<SnapshotManager> {
    let store = Arc::new(MemStore::new(cfg.max_backup_size_bytes));
    Ok(SnapshotManager::new(store, live.clone(), live, cfg)?)
}

fn project() -> Arc<MemoryState> {
    Arc::new(MemoryState::new(Some(ProjectState::new(
        json!({"id": "p"}),
        json!([]),
    ))))
}

#[test]
fn periodic_tasks_capture_and_stop() -> Result<()> {
    let cfg = SnapConfig::default()
        .with_auto_backup_interval_ms(40)
        .with_safety_backup_interval_ms(90)
        .with_max_auto_backups(3);
    let mgr = manager(cfg, project())?;

    mgr.init()?;
    mgr.init()?; // idempotent
    assert!(mgr.is_scheduler_running());
    assert!(mgr.get_stats()?.next_auto_backup_eta_ms.is_some());

    thread::sleep(Duration::from_millis(600));
    mgr.shutdown();
    mgr.shutdown();
    assert!(!mgr.is_scheduler_running());
    assert_eq!(mgr.get_stats()?.next_auto_backup_eta_ms, None);

    let auto = mgr.list_snapshots(Some(Tier::Auto))?.len();
    let safety = mgr.list_snapshots(Some(Tier::Safety))?.len();
    assert_eq!(auto, 3, "auto ticks fill up to the cap");
    assert!(safety >= 1, "safety ticked at least once");

    // nothing runs after shutdown
    let total = mgr.list_snapshots(None)?.len();
    thread::sleep(Duration::from_millis(150));
    assert_eq!(mgr.list_snapshots(None)?.len(), total);
    Ok(())
}

#[test]
fn ticks_without_project_write_nothing() -> Result<()> {
    let live = Arc::new(MemoryState::default());
    let cfg = SnapConfig::default()
        .with_auto_backup_interval_ms(20)
        .with_safety_backup_interval_ms(20);
    let mgr = manager(cfg, live)?;
    mgr.init()?;
    thread::sleep(Duration::from_millis(150));
    mgr.shutdown();
    assert!(mgr.list_snapshots(None)?.is_empty());
    Ok(())
}

#[test]
fn zero_interval_and_disabled_flag() -> Result<()> {
    let cfg = SnapConfig::default()
        .with_auto_backup_interval_ms(0)
        .with_safety_backup_interval_ms(30);
    let mgr = manager(cfg, project())?;
    mgr.init()?;
    assert_eq!(mgr.get_stats()?.next_auto_backup_eta_ms, None);
    thread::sleep(Duration::from_millis(150));
    mgr.shutdown();
    assert!(mgr.list_snapshots(Some(Tier::Auto))?.is_empty());
    assert!(!mgr.list_snapshots(Some(Tier::Safety))?.is_empty());

    let off = SnapConfig::default()
        .with_auto_backup_interval_ms(10)
        .with_scheduler_enabled(false);
    let mgr = manager(off, project())?;
    mgr.init()?;
    assert!(!mgr.is_scheduler_running());
    Ok(())
}
