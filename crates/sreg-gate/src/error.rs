use sreg_types::Key;
use sreg_view::ViewError;

use crate::schema::JsonKind;

/// A configuration blob rejected by a schema plugin.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    #[error("no schema registered for type '{0}'")]
    UnknownType(String),

    #[error("configuration for type '{spec_type}' must be an object")]
    NotAnObject { spec_type: String },

    #[error("configuration for type '{spec_type}' is missing field '{field}'")]
    MissingField { spec_type: String, field: String },

    #[error("configuration field '{field}' for type '{spec_type}' must be {expected}")]
    WrongKind {
        spec_type: String,
        field: String,
        expected: JsonKind,
    },

    #[error("configuration for type '{spec_type}' is invalid: {reason}")]
    Invalid { spec_type: String, reason: String },
}

/// The reason a candidate was rejected. Produced by the first failing stage.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Violation {
    /// A field breaks a shape rule.
    #[error("invalid {field}: {reason}")]
    Structural { field: String, reason: String },

    /// A referenced entity is not in its view.
    #[error("{field} references {key}, which does not exist")]
    MissingReference { field: String, key: Key },

    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// An update tried to change a field that is fixed after creation.
    #[error("{field} cannot change from '{from}' to '{to}'")]
    ImmutableField {
        field: String,
        from: String,
        to: String,
    },
}

impl Violation {
    pub fn structural(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Structural {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Errors that stop the chain from reaching a decision at all.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    /// The views backing a referential check could not be read.
    #[error("view error: {0}")]
    View(#[from] ViewError),

    /// A stage returned an unexpected error.
    #[error("stage error in '{stage}': {message}")]
    Stage { stage: String, message: String },
}

impl ValidationError {
    /// Create a stage error with a name and message.
    pub fn stage(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Stage {
            stage: stage.into(),
            message: message.into(),
        }
    }
}
