use std::path::PathBuf;

use thiserror::Error;

use sreg_gate::{SchemaError, ValidationError, Violation};
use sreg_handlers::HandlerError;
use sreg_log::LogError;
use sreg_repository::RepositoryError;
use sreg_types::{Key, TypeError};
use sreg_view::ViewError;

/// Caller-facing failures of registry operations.
///
/// A rejected mutation (anything but `LogUnavailable`, `Log` and `View`)
/// never reaches the log.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0} already exists")]
    AlreadyExists(Key),

    #[error("{0} not found")]
    NotFound(Key),

    #[error("referential integrity: {field} references {key}, which does not exist")]
    ReferentialIntegrity { field: String, key: Key },

    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    /// A structural or update-only rule failed.
    #[error("validation failed: {0}")]
    Validation(Violation),

    #[error(transparent)]
    Handler(#[from] HandlerError),

    #[error("event log unavailable: {0}")]
    LogUnavailable(LogError),

    #[error("event log error: {0}")]
    Log(LogError),

    #[error("view error: {0}")]
    View(ViewError),

    #[error("conversion error: {0}")]
    Conversion(#[from] TypeError),

    #[error("validator error: {0}")]
    Validator(ValidationError),
}

impl ServiceError {
    pub fn is_log_unavailable(&self) -> bool {
        matches!(self, Self::LogUnavailable(_))
    }
}

impl From<Violation> for ServiceError {
    fn from(violation: Violation) -> Self {
        match violation {
            Violation::MissingReference { field, key } => Self::ReferentialIntegrity { field, key },
            Violation::Schema(err) => Self::Schema(err),
            other => Self::Validation(other),
        }
    }
}

impl From<LogError> for ServiceError {
    fn from(err: LogError) -> Self {
        if err.is_unavailable() {
            Self::LogUnavailable(err)
        } else {
            Self::Log(err)
        }
    }
}

impl From<ViewError> for ServiceError {
    fn from(err: ViewError) -> Self {
        match err {
            ViewError::Log(err) => err.into(),
            other => Self::View(other),
        }
    }
}

impl From<ValidationError> for ServiceError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::View(err) => err.into(),
            other => Self::Validator(other),
        }
    }
}

impl From<RepositoryError> for ServiceError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Log(err) => err.into(),
            RepositoryError::View(err) => err.into(),
            RepositoryError::Conversion(err) => Self::Conversion(err),
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("cannot render config: {0}")]
    Render(#[from] toml::ser::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use sreg_types::{EntityType, Key};

    #[test]
    fn violations_map_onto_the_taxonomy() {
        let key = Key::new(EntityType::Zone, "aws");
        let err: ServiceError = Violation::MissingReference {
            field: "zone".into(),
            key: key.clone(),
        }
        .into();
        assert!(matches!(err, ServiceError::ReferentialIntegrity { key: k, .. } if k == key));

        let err: ServiceError = Violation::Schema(SchemaError::UnknownType("x".into())).into();
        assert!(matches!(err, ServiceError::Schema(_)));

        let err: ServiceError = Violation::structural("inputs", "empty").into();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[test]
    fn unavailable_log_errors_are_classified() {
        let err: ServiceError = RepositoryError::Log(LogError::Timeout { millis: 10 }).into();
        assert!(err.is_log_unavailable());

        let err: ServiceError = LogError::InvalidRecord("bad".into()).into();
        assert!(matches!(err, ServiceError::Log(_)));

        let err: ServiceError = ViewError::Log(LogError::Unavailable("down".into())).into();
        assert!(err.is_log_unavailable());
    }
}
