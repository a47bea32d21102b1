use diesel_async::pooled_connection::PoolError;
use thiserror::Error;

use crate::cache::CacheError;
use crate::config::ConfigError;
use crate::error::DatabaseErrorConverter;

/// Application-wide error type.
///
/// Cache failures keep their own variant so callers can tell an unreachable
/// or corrupted cache apart from a missing entity.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found error with entity, field, and value information
    #[error("Resource not found: {entity} with {field}={value}")]
    NotFound {
        entity: String,
        field: String,
        value: String,
    },

    /// Duplicate entry error for unique constraint violations
    #[error("Duplicate entry: {entity}.{field} = '{value}' already exists")]
    Duplicate {
        entity: String,
        field: String,
        value: String,
    },

    /// Validation error with field-specific details
    #[error("Validation failed for {field}: {reason}")]
    Validation { field: String, reason: String },

    /// Forbidden access error with authorization message
    #[error("Forbidden: {message}")]
    Forbidden { message: String },

    /// The write would break a relationship that still holds
    #[error("Conflict: {message}")]
    Conflict { message: String },

    /// Database operation error with operation context
    #[error("Database operation failed: {operation}")]
    Database {
        operation: String,
        #[source]
        source: anyhow::Error,
    },

    /// Connection pool error
    #[error("Connection pool error")]
    ConnectionPool {
        #[source]
        source: anyhow::Error,
    },

    #[error(transparent)]
    Cache(#[from] CacheError),

    /// Configuration error with key information
    #[error("Configuration error: {key}")]
    Configuration {
        key: String,
        #[source]
        source: anyhow::Error,
    },

    /// Internal error for unexpected failures
    #[error("Internal error")]
    Internal {
        #[source]
        source: anyhow::Error,
    },
}

impl AppError {
    pub fn not_found(entity: &str, field: &str, value: impl ToString) -> Self {
        AppError::NotFound {
            entity: entity.to_string(),
            field: field.to_string(),
            value: value.to_string(),
        }
    }

    pub fn duplicate(entity: &str, field: &str, value: impl ToString) -> Self {
        AppError::Duplicate {
            entity: entity.to_string(),
            field: field.to_string(),
            value: value.to_string(),
        }
    }

    pub fn validation(field: &str, reason: impl Into<String>) -> Self {
        AppError::Validation {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        AppError::Forbidden {
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        AppError::Conflict {
            message: message.into(),
        }
    }

    /// Whether the error is a domain outcome rather than an infrastructure failure.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            AppError::NotFound { .. }
                | AppError::Duplicate { .. }
                | AppError::Validation { .. }
                | AppError::Forbidden { .. }
                | AppError::Conflict { .. }
        )
    }
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        AppError::Internal { source: error }
    }
}

impl From<diesel::result::Error> for AppError {
    fn from(error: diesel::result::Error) -> Self {
        DatabaseErrorConverter::convert_diesel_error(error, "database operation")
    }
}

impl From<bb8::RunError<PoolError>> for AppError {
    fn from(error: bb8::RunError<PoolError>) -> Self {
        AppError::ConnectionPool {
            source: anyhow::Error::new(error),
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(error: ConfigError) -> Self {
        let key = error.field().unwrap_or("settings").to_string();
        AppError::Configuration {
            key,
            source: anyhow::Error::new(error),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let first = errors
            .field_errors()
            .into_iter()
            .find_map(|(field, errs)| errs.first().map(|e| (field.to_string(), e.clone())));

        match first {
            Some((field, error)) => AppError::Validation {
                field,
                reason: error
                    .message
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| error.code.to_string()),
            },
            None => AppError::Validation {
                field: "input".to_string(),
                reason: errors.to_string(),
            },
        }
    }
}

/// Type alias for Result with AppError to simplify function signatures
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use validator::Validate;

    use super::*;
    use crate::models::NewCompany;

    #[test]
    fn test_validation_errors_convert_to_first_field() {
        let company = NewCompany::new("", uuid::Uuid::new_v4());
        let err: AppError = company.validate().unwrap_err().into();
        match err {
            AppError::Validation { field, reason } => {
                assert_eq!(field, "name");
                assert!(reason.contains("between 1 and 100"));
            }
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn test_cache_errors_are_not_client_errors() {
        let err: AppError = CacheError::Connection("refused".into()).into();
        assert!(!err.is_client_error());
        assert!(AppError::not_found("item", "id", 1).is_client_error());
    }
}
