use sreg_log::LogError;
use sreg_types::TypeError;
use sreg_view::ViewError;

/// Errors from repository operations.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// The append was refused or failed.
    #[error("log error: {0}")]
    Log(#[from] LogError),

    /// The view could not serve the read.
    #[error("view error: {0}")]
    View(#[from] ViewError),

    /// A model could not be mapped to or from its wire form.
    #[error("conversion error: {0}")]
    Conversion(#[from] TypeError),
}

impl RepositoryError {
    /// Whether the underlying log could not take the write.
    pub fn is_log_unavailable(&self) -> bool {
        match self {
            Self::Log(err) | Self::View(ViewError::Log(err)) => err.is_unavailable(),
            _ => false,
        }
    }
}

/// Convenience alias for repository results.
pub type RepositoryResult<T> = std::result::Result<T, RepositoryError>;
