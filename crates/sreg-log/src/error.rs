use std::io;

/// Errors produced by event log transports and the event sender.
#[derive(Debug, thiserror::Error)]
pub enum LogError {
    /// The transport cannot accept or serve requests right now.
    #[error("log unavailable: {0}")]
    Unavailable(String),

    /// An append or read did not complete within the configured bound.
    #[error("log operation timed out after {millis}ms")]
    Timeout { millis: u64 },

    /// I/O error in a file-backed log.
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// Encoding or decoding of a record failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A stored record could not be read back intact.
    #[error("corrupt record at position {position}: {reason}")]
    Corrupt { position: u64, reason: String },

    /// A record whose parts contradict each other.
    #[error("invalid record: {0}")]
    InvalidRecord(String),

    /// A file log was configured without a path.
    #[error("file log requires a path")]
    MissingPath,

    /// A lock was poisoned by a panicking writer.
    #[error("lock poisoned")]
    LockPoisoned,
}

impl LogError {
    /// Whether this error means the log could not take the write at all.
    ///
    /// Callers surface these as "log unavailable"; every other variant is
    /// a data or configuration problem.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            Self::Unavailable(_) | Self::Timeout { .. } | Self::Io(_) | Self::LockPoisoned
        )
    }
}

impl From<serde_json::Error> for LogError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Convenience alias used throughout the log crate.
pub type Result<T> = std::result::Result<T, LogError>;
