// src/error.rs

use thiserror::Error;

use crate::tier::Tier;

/// Errors surfaced by snapshot operations.
///
/// "No active project" is deliberately absent: a capture with nothing to
/// snapshot is a successful no-op (`CaptureOutcome::NoActiveProject`).
#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("another capture or restore is already in progress")]
    Busy,

    #[error("snapshot of {size} bytes exceeds the limit of {limit} bytes")]
    TooLarge { size: u64, limit: u64 },

    #[error("snapshot '{key}' not found")]
    NotFound { key: String },

    #[error("malformed snapshot: {reason}")]
    Malformed { reason: String },

    #[error("invalid store key '{key}'")]
    InvalidKey { key: String },

    #[error("manual snapshots require a non-empty description")]
    InvalidDescription,

    #[error("tier '{tier}' cannot be captured directly")]
    InvalidTier { tier: Tier },

    #[error("failed to apply section '{section}': {message}")]
    Apply { section: String, message: String },

    #[error("configuration error: {message}")]
    Config { message: String },

    #[error("storage error: {0:#}")]
    Storage(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, SnapshotError>;

// Convenience constructors
impl SnapshotError {
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into() }
    }

    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::Malformed {
            reason: reason.into(),
        }
    }

    pub fn invalid_key(key: impl Into<String>) -> Self {
        Self::InvalidKey { key: key.into() }
    }

    pub fn too_large(size: u64, limit: u64) -> Self {
        Self::TooLarge { size, limit }
    }

    pub fn apply(section: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Apply {
            section: section.into(),
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Busy)
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::Malformed { .. })
    }

    pub fn is_too_large(&self) -> bool {
        matches!(self, Self::TooLarge { .. })
    }

    pub fn is_invalid_key(&self) -> bool {
        matches!(self, Self::InvalidKey { .. })
    }
}

impl From<serde_json::Error> for SnapshotError {
    fn from(e: serde_json::Error) -> Self {
        Self::Storage(anyhow::Error::new(e).context("json serialization"))
    }
}
