//! Integrity validator — accepts or rejects a blob as a structurally sound snapshot.
//!
//! Checks, in order (first failure wins, no repair is attempted):
//! 1. the blob parses as a JSON object;
//! 2. `payload` is an object carrying `project` (object) and `volumes` (array);
//! 3. `schemaVersion` is "MAJOR[.MINOR]" with a supported MAJOR (newer minors accepted).
//!
//! `tier` and `timestamp` are optional here (external artifacts get them replaced on
//! import), but when present they must be well-typed.

use serde_json::Value;

use crate::consts::SCHEMA_MAJOR;
use crate::error::{Result, SnapshotError};
use crate::tier::Tier;

pub fn validate(blob: &[u8]) -> Result<()> {
    let root: Value = serde_json::from_slice(blob)
        .map_err(|e| SnapshotError::malformed(format!("not valid JSON: {e}")))?;
    let obj = root
        .as_object()
        .ok_or_else(|| SnapshotError::malformed("top level is not an object"))?;

    let payload = obj
        .get("payload")
        .ok_or_else(|| SnapshotError::malformed("missing 'payload'"))?
        .as_object()
        .ok_or_else(|| SnapshotError::malformed("'payload' is not an object"))?;

    match payload.get("project") {
        Some(Value::Object(_)) => {}
        Some(Value::Null) | None => {
            return Err(SnapshotError::malformed("missing 'payload.project'"))
        }
        Some(_) => return Err(SnapshotError::malformed("'payload.project' is not an object")),
    }
    match payload.get("volumes") {
        Some(Value::Array(_)) => {}
        None => return Err(SnapshotError::malformed("missing 'payload.volumes'")),
        Some(_) => return Err(SnapshotError::malformed("'payload.volumes' is not an array")),
    }

    let version = obj
        .get("schemaVersion")
        .ok_or_else(|| SnapshotError::malformed("missing 'schemaVersion'"))?
        .as_str()
        .ok_or_else(|| SnapshotError::malformed("'schemaVersion' is not a string"))?;
    check_schema_version(version)?;

    if let Some(t) = obj.get("tier") {
        let s = t
            .as_str()
            .ok_or_else(|| SnapshotError::malformed("'tier' is not a string"))?;
        s.parse::<Tier>().map_err(SnapshotError::malformed)?;
    }
    if let Some(ts) = obj.get("timestamp") {
        if ts.as_u64().is_none() {
            return Err(SnapshotError::malformed(
                "'timestamp' is not a non-negative integer",
            ));
        }
    }
    Ok(())
}

/// Accepts "1", "1.0", "1.7"; rejects other majors and non-numeric tags.
pub fn check_schema_version(version: &str) -> Result<()> {
    let mut parts = version.trim().splitn(2, '.');
    let major = parts
        .next()
        .and_then(|m| m.parse::<u32>().ok())
        .ok_or_else(|| SnapshotError::malformed(format!("unrecognized schemaVersion '{version}'")))?;
    if let Some(minor) = parts.next() {
        if minor.is_empty() || !minor.bytes().all(|b| b.is_ascii_digit() || b == b'.') {
            return Err(SnapshotError::malformed(format!(
                "unrecognized schemaVersion '{version}'"
            )));
        }
    }
    if major != SCHEMA_MAJOR {
        return Err(SnapshotError::malformed(format!(
            "unsupported schemaVersion '{version}' (supported major: {SCHEMA_MAJOR})"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn reason(blob: &[u8]) -> String {
        match validate(blob) {
            Err(SnapshotError::Malformed { reason }) => reason,
            other => panic!("expected Malformed, got {:?}", other),
        }
    }

    fn good() -> Value {
        json!({
            "schemaVersion": "1.0",
            "tier": "auto",
            "timestamp": 5,
            "description": "",
            "payload": {"project": {"id": "p"}, "volumes": []}
        })
    }

    #[test]
    fn accepts_well_formed_record() {
        assert!(validate(&serde_json::to_vec(&good()).unwrap()).is_ok());
    }

    #[test]
    fn checks_run_in_order() {
        assert!(reason(b"{oops").starts_with("not valid JSON"));
        assert_eq!(reason(b"[1,2]"), "top level is not an object");

        // missing payload wins over a bad schemaVersion
        let v = json!({"schemaVersion": "9.0"});
        assert_eq!(reason(&serde_json::to_vec(&v).unwrap()), "missing 'payload'");

        let mut v = good();
        v["payload"].as_object_mut().unwrap().remove("project");
        v["schemaVersion"] = json!("2.0");
        assert_eq!(reason(&serde_json::to_vec(&v).unwrap()), "missing 'payload.project'");

        let mut v = good();
        v["payload"]["volumes"] = json!({});
        assert_eq!(
            reason(&serde_json::to_vec(&v).unwrap()),
            "'payload.volumes' is not an array"
        );
    }

    #[test]
    fn schema_version_forward_compatible_minor() {
        assert!(check_schema_version("1").is_ok());
        assert!(check_schema_version("1.0").is_ok());
        assert!(check_schema_version("1.12").is_ok());
        assert!(check_schema_version("2.0").is_err());
        assert!(check_schema_version("v1").is_err());
        assert!(check_schema_version("1.x").is_err());
        assert!(check_schema_version("").is_err());
    }

    #[test]
    fn missing_schema_version_is_malformed() {
        let mut v = good();
        v.as_object_mut().unwrap().remove("schemaVersion");
        assert_eq!(reason(&serde_json::to_vec(&v).unwrap()), "missing 'schemaVersion'");
    }

    #[test]
    fn tier_and_timestamp_are_optional_but_typed() {
        let mut v = good();
        v.as_object_mut().unwrap().remove("tier");
        v.as_object_mut().unwrap().remove("timestamp");
        assert!(validate(&serde_json::to_vec(&v).unwrap()).is_ok());

        let mut v = good();
        v["tier"] = json!("weekly");
        assert!(validate(&serde_json::to_vec(&v).unwrap()).is_err());

        let mut v = good();
        v["timestamp"] = json!(-1);
        assert!(validate(&serde_json::to_vec(&v).unwrap()).is_err());
    }
}
