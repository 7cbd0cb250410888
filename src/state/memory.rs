//! In-process live state.

use std::sync::Mutex;

use anyhow::anyhow;

use super::{ProjectState, StateConsumer, StateProducer};
use crate::error::{Result, SnapshotError};

/// Holds the live state behind a mutex. `None` means no project is open.
#[derive(Default)]
pub struct MemoryState {
    inner: Mutex<Option<ProjectState>>,
}

impl MemoryState {
    pub fn new(state: Option<ProjectState>) -> Self {
        Self {
            inner: Mutex::new(state),
        }
    }

    pub fn current(&self) -> Option<ProjectState> {
        self.inner.lock().ok().and_then(|g| g.clone())
    }

    pub fn set(&self, state: Option<ProjectState>) {
        if let Ok(mut g) = self.inner.lock() {
            *g = state;
        }
    }
}

fn poisoned() -> SnapshotError {
    SnapshotError::Storage(anyhow!("live state lock poisoned"))
}

impl StateProducer for MemoryState {
    fn snapshot(&self) -> Result<Option<ProjectState>> {
        let g = self.inner.lock().map_err(|_| poisoned())?;
        Ok(g.clone())
    }
}

impl StateConsumer for MemoryState {
    fn apply(&self, state: &ProjectState) -> Result<()> {
        let mut g = self.inner.lock().map_err(|_| poisoned())?;
        match g.as_mut() {
            Some(live) => live.merge_from(state),
            None => *g = Some(state.clone()),
        }
        Ok(())
    }
}
