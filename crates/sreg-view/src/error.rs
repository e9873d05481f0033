use sreg_log::LogError;
use sreg_types::EntityType;

/// Errors produced by materialized views and the materializer.
#[derive(Debug, thiserror::Error)]
pub enum ViewError {
    #[error("log error: {0}")]
    Log(#[from] LogError),

    #[error("{actual} record routed to the {expected} view")]
    WrongEntityType {
        expected: EntityType,
        actual: EntityType,
    },

    #[error("timed out waiting for log position {position} to be applied")]
    WaitTimeout { position: u64 },

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("view lock poisoned")]
    LockPoisoned,
}

/// Convenience alias used throughout the view crate.
pub type Result<T> = std::result::Result<T, ViewError>;
