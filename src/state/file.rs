//! Live state stored as a single JSON document on disk.
//!
//! - missing file  -> no active project
//! - apply()       -> read the document, overwrite the sections present in the
//!                    snapshot, keep every other key, write back via tmp+rename.

use anyhow::Context;
use serde_json::{Map, Value};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use super::{ProjectState, StateConsumer, StateProducer};
use crate::error::{Result, SnapshotError};

pub struct JsonFileState {
    path: PathBuf,
}

impl JsonFileState {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_document(&self) -> Result<Option<Map<String, Value>>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let bytes =
            fs::read(&self.path).with_context(|| format!("read state {}", self.path.display()))?;
        let v: Value = serde_json::from_slice(&bytes)
            .with_context(|| format!("parse state {}", self.path.display()))?;
        match v {
            Value::Object(m) => Ok(Some(m)),
            _ => Err(anyhow::anyhow!("state {} is not a JSON object", self.path.display()).into()),
        }
    }

    fn write_document(&self, doc: &Map<String, Value>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("create {}", parent.display()))?;
            }
        }
        let tmp = self.path.with_extension("json.tmp");
        let data = serde_json::to_vec_pretty(doc)?;
        {
            let mut f = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(&tmp)
                .with_context(|| format!("open {}", tmp.display()))?;
            f.write_all(&data)
                .with_context(|| format!("write {}", tmp.display()))?;
            f.sync_all()
                .with_context(|| format!("fsync {}", tmp.display()))?;
        }
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("rename {} -> {}", tmp.display(), self.path.display()))?;
        Ok(())
    }
}

impl StateProducer for JsonFileState {
    fn snapshot(&self) -> Result<Option<ProjectState>> {
        let doc = match self.read_document()? {
            Some(d) => d,
            None => return Ok(None),
        };
        // A document without project identity is "nothing open", not an error.
        if doc.get("project").map(|v| v.is_null()).unwrap_or(true) {
            return Ok(None);
        }
        let state: ProjectState = serde_json::from_value(Value::Object(doc))
            .with_context(|| format!("decode state {}", self.path.display()))?;
        Ok(Some(state))
    }
}

impl StateConsumer for JsonFileState {
    fn apply(&self, state: &ProjectState) -> Result<()> {
        let mut doc = self.read_document()?.unwrap_or_default();
        for (name, value) in state.sections() {
            doc.insert(name.to_string(), value.clone());
        }
        self.write_document(&doc)
            .map_err(|e| SnapshotError::apply("document", format!("{e}")))
    }
}
