use thiserror::Error;

use sreg_types::EntityType;

#[derive(Debug, Error)]
pub enum HandlerError {
    /// The handler refused the mutation.
    #[error("handler '{handler}' rejected the mutation: {reason}")]
    Rejected { handler: String, reason: String },

    /// The handler could not complete (for example, an external call failed).
    #[error("handler '{handler}' failed: {message}")]
    Failed { handler: String, message: String },

    #[error("no handler registered for {entity_type} of type '{spec_type}'")]
    NoHandler {
        entity_type: EntityType,
        spec_type: String,
    },
}

impl HandlerError {
    pub fn rejected(handler: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Rejected {
            handler: handler.into(),
            reason: reason.into(),
        }
    }

    pub fn failed(handler: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Failed {
            handler: handler.into(),
            message: message.into(),
        }
    }
}

pub type HandlerResult<T> = Result<T, HandlerError>;
