//! state — the seams to the host application.
//!
//! - StateProducer: pull side. `snapshot()` returns the live project state, or `None`
//!   when no project is open (capture then becomes a no-op).
//! - StateConsumer: push side. `apply()` replaces every section present in the
//!   given state; sections that are absent stay as they are in the live state.
//!
//! Two ready-made implementations:
//! - JsonFileState: live state kept as a JSON document on disk (used by the CLI).
//! - MemoryState: in-process state (tests, embedding).

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

mod file;
mod memory;

pub use file::JsonFileState;
pub use memory::MemoryState;

/// Full application state as captured into a snapshot payload.
///
/// `project` and `volumes` are always present; every other section is optional
/// so restore can leave sections missing from an older snapshot untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectState {
    pub project: Value,
    pub volumes: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub world_data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub characters: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lore_data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub narrative_data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goals: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daily_stats: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quick_notes: Option<Value>,
}

impl ProjectState {
    /// Minimal state: project identity plus the volume tree.
    pub fn new(project: Value, volumes: Value) -> Self {
        Self {
            project,
            volumes,
            world_data: None,
            characters: None,
            lore_data: None,
            narrative_data: None,
            settings: None,
            goals: None,
            daily_stats: None,
            quick_notes: None,
        }
    }

    /// Sections present in this state as (wire name, value), in wire order.
    pub fn sections(&self) -> Vec<(&'static str, &Value)> {
        let optional = [
            ("worldData", &self.world_data),
            ("characters", &self.characters),
            ("loreData", &self.lore_data),
            ("narrativeData", &self.narrative_data),
            ("settings", &self.settings),
            ("goals", &self.goals),
            ("dailyStats", &self.daily_stats),
            ("quickNotes", &self.quick_notes),
        ];
        let mut out = vec![("project", &self.project), ("volumes", &self.volumes)];
        for (name, v) in optional {
            if let Some(v) = v {
                out.push((name, v));
            }
        }
        out
    }

    /// Replace every section of `self` that is present in `other`.
    pub fn merge_from(&mut self, other: &ProjectState) {
        self.project = other.project.clone();
        self.volumes = other.volumes.clone();
        overlay(&mut self.world_data, &other.world_data);
        overlay(&mut self.characters, &other.characters);
        overlay(&mut self.lore_data, &other.lore_data);
        overlay(&mut self.narrative_data, &other.narrative_data);
        overlay(&mut self.settings, &other.settings);
        overlay(&mut self.goals, &other.goals);
        overlay(&mut self.daily_stats, &other.daily_stats);
        overlay(&mut self.quick_notes, &other.quick_notes);
    }
}

fn overlay(dst: &mut Option<Value>, src: &Option<Value>) {
    if let Some(v) = src {
        *dst = Some(v.clone());
    }
}

pub trait StateProducer: Send + Sync {
    /// Current live state, or `None` when there is no active project.
    fn snapshot(&self) -> Result<Option<ProjectState>>;
}

pub trait StateConsumer: Send + Sync {
    /// Replace each live section present in `state`. A section that cannot be
    /// applied is reported as `SnapshotError::Apply`.
    fn apply(&self, state: &ProjectState) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn optional_sections_are_omitted_on_the_wire() {
        let s = ProjectState::new(json!({"id": "p1"}), json!([]));
        let v = serde_json::to_value(&s).unwrap();
        let obj = v.as_object().unwrap();
        assert_eq!(obj.len(), 2);
        assert!(obj.contains_key("project") && obj.contains_key("volumes"));
    }

    #[test]
    fn merge_keeps_absent_sections() {
        let mut live = ProjectState::new(json!({"id": "p1"}), json!([1]));
        live.characters = Some(json!(["alice"]));
        live.settings = Some(json!({"theme": "dark"}));

        let mut snap = ProjectState::new(json!({"id": "p1", "title": "old"}), json!([]));
        snap.settings = Some(json!({"theme": "light"}));

        live.merge_from(&snap);
        assert_eq!(live.project["title"], "old");
        assert_eq!(live.volumes, json!([]));
        assert_eq!(live.settings, Some(json!({"theme": "light"})));
        assert_eq!(live.characters, Some(json!(["alice"])));
    }

    #[test]
    fn sections_follow_wire_order() {
        let mut s = ProjectState::new(json!({}), json!([]));
        s.quick_notes = Some(json!([]));
        s.world_data = Some(json!({}));
        let names: Vec<&str> = s.sections().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["project", "volumes", "worldData", "quickNotes"]);
    }
}
