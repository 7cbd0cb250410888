use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;

use snapkeep::{DirStore, JsonFileState, SnapConfig, SnapshotManager};

use crate::cli::StoreArgs;

/// Config file (if any), then SNAPKEEP_* env on top.
pub fn load_config(args: &StoreArgs) -> Result<SnapConfig> {
    let base = match &args.config {
        Some(p) => SnapConfig::from_json_file(p)?,
        None => SnapConfig::default(),
    };
    Ok(base.apply_env().build())
}

/// Live state document: --state, else <path>/state.json.
pub fn state_path(args: &StoreArgs) -> PathBuf {
    args.state
        .clone()
        .unwrap_or_else(|| args.path.join("state.json"))
}

/// Open the store and wire a manager over the live state document.
/// The scheduler is not started here.
pub fn open_manager(args: &StoreArgs) -> Result<SnapshotManager> {
    let cfg = load_config(args)?;
    let store = DirStore::open_or_create(&args.path, cfg.max_backup_size_bytes)
        .with_context(|| format!("open store {}", args.path.display()))?;
    let state = Arc::new(JsonFileState::new(&state_path(args)));
    let mgr = SnapshotManager::new(Arc::new(store), state.clone(), state, cfg)?;
    Ok(mgr)
}
