//! Snapshot record — the persisted blob for one backup key.
//!
//! Wire format (compact JSON):
//! {
//!   "schemaVersion": "1.0",
//!   "tier": "manual",
//!   "timestamp": 1760000000000,
//!   "description": "before big edit",
//!   "payload": { "project": {...}, "volumes": [...], ... }
//! }
//!
//! `payload` is held as raw JSON text: the bytes produced at capture are the bytes
//! that export writes, import copies and restore decodes. Records are never
//! mutated in place; import builds a new record around the same payload text.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::value::RawValue;

use crate::consts::{IMPORTED_DESCRIPTION, SCHEMA_VERSION};
use crate::error::{Result, SnapshotError};
use crate::state::ProjectState;
use crate::tier::Tier;

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotRecord {
    pub schema_version: String,
    pub tier: Tier,
    pub timestamp: u64,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub description: String,
    pub payload: Box<RawValue>,
}

/// Loose view used when admitting external artifacts: tier/timestamp may be
/// missing or foreign, they are replaced on import anyway.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ArtifactView {
    #[serde(default)]
    description: Option<String>,
    payload: Box<RawValue>,
}

impl SnapshotRecord {
    /// Frame the producer's state into a new record.
    pub fn capture(
        tier: Tier,
        timestamp: u64,
        description: &str,
        state: &ProjectState,
    ) -> Result<Self> {
        let payload = serde_json::value::to_raw_value(state)?;
        Ok(Self {
            schema_version: SCHEMA_VERSION.to_string(),
            tier,
            timestamp,
            description: description.to_string(),
            payload,
        })
    }

    /// Re-frame a validated external artifact as an `Imported` record. The payload
    /// text is carried over byte for byte.
    pub fn imported_from(artifact: &[u8], timestamp: u64) -> Result<Self> {
        let view: ArtifactView = serde_json::from_slice(artifact)
            .map_err(|e| SnapshotError::malformed(format!("artifact does not parse: {e}")))?;
        let description = match view.description {
            Some(d) if !d.trim().is_empty() => d,
            _ => IMPORTED_DESCRIPTION.to_string(),
        };
        Ok(Self {
            schema_version: SCHEMA_VERSION.to_string(),
            tier: Tier::Imported,
            timestamp,
            description,
            payload: view.payload,
        })
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes)
            .map_err(|e| SnapshotError::malformed(format!("record does not parse: {e}")))
    }

    /// Raw payload text.
    pub fn payload_text(&self) -> &str {
        self.payload.get()
    }

    /// Decode the payload into typed sections for the consumer.
    pub fn decode_state(&self) -> Result<ProjectState> {
        serde_json::from_str(self.payload.get())
            .map_err(|e| SnapshotError::malformed(format!("payload does not decode: {e}")))
    }
}

// `"description": null` reads as empty, like a missing field.
fn null_as_empty<'de, D>(d: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(d)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn state() -> ProjectState {
        let mut s = ProjectState::new(json!({"id": "p1", "title": "Novel"}), json!([{"id": "v1"}]));
        s.characters = Some(json!([{"name": "Ada"}]));
        s
    }

    #[test]
    fn capture_writes_schema_and_fields() {
        let r = SnapshotRecord::capture(Tier::Manual, 42, "before edit", &state()).unwrap();
        let v: serde_json::Value = serde_json::from_slice(&r.to_bytes().unwrap()).unwrap();
        assert_eq!(v["schemaVersion"], SCHEMA_VERSION);
        assert_eq!(v["tier"], "manual");
        assert_eq!(v["timestamp"], 42);
        assert_eq!(v["description"], "before edit");
        assert_eq!(v["payload"]["project"]["id"], "p1");
    }

    #[test]
    fn imported_keeps_payload_text_and_forces_tier() {
        let r = SnapshotRecord::capture(Tier::Auto, 1, "", &state()).unwrap();
        let bytes = r.to_bytes().unwrap();
        let imp = SnapshotRecord::imported_from(&bytes, 99).unwrap();
        assert_eq!(imp.tier, Tier::Imported);
        assert_eq!(imp.timestamp, 99);
        assert_eq!(imp.description, IMPORTED_DESCRIPTION);
        assert_eq!(imp.payload_text(), r.payload_text());
    }

    #[test]
    fn decode_state_roundtrips_sections() {
        let r = SnapshotRecord::capture(Tier::Safety, 7, "", &state()).unwrap();
        let back = SnapshotRecord::from_bytes(&r.to_bytes().unwrap()).unwrap();
        assert_eq!(back.decode_state().unwrap(), state());
    }

    #[test]
    fn null_description_defaults_on_import_and_read() {
        let artifact = br#"{"schemaVersion":"1.0","description":null,"payload":{"project":{"id":"p"},"volumes":[]}}"#;
        let imp = SnapshotRecord::imported_from(artifact, 5).unwrap();
        assert_eq!(imp.description, IMPORTED_DESCRIPTION);

        let stored = br#"{"schemaVersion":"1.0","tier":"auto","timestamp":1,"description":null,"payload":{"project":{},"volumes":[]}}"#;
        assert_eq!(SnapshotRecord::from_bytes(stored).unwrap().description, "");
    }

    #[test]
    fn garbage_is_malformed() {
        let e = SnapshotRecord::from_bytes(b"not json").unwrap_err();
        assert!(e.is_malformed());
    }
}
