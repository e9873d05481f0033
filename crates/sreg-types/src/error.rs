use thiserror::Error;

use crate::key::EntityType;

/// Errors produced by type operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TypeError {
    #[error("unknown entity type: {0}")]
    UnknownEntityType(String),

    #[error("expected a {expected} key, got a {actual} key")]
    KeyTypeMismatch {
        expected: EntityType,
        actual: EntityType,
    },

    #[error("invalid key {key}: {reason}")]
    InvalidKey { key: String, reason: String },

    #[error("invalid link '{field}': {reason}")]
    InvalidLink { field: String, reason: String },

    #[error("serialization error: {0}")]
    Serialization(String),
}
