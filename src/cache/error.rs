//! Cache error types.

use thiserror::Error;

/// Errors that can occur during cache operations.
///
/// A miss is never an error: absent entries come back as `Ok(None)`.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Cache operation failed: {0}")]
    Operation(String),

    #[error("Cache connection failed: {0}")]
    Connection(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The entry decoded, but into a different shape than the caller asked for.
    #[error("Unexpected cached value for {key}: expected {expected}")]
    Type { key: String, expected: &'static str },
}

impl From<serde_json::Error> for CacheError {
    fn from(error: serde_json::Error) -> Self {
        CacheError::Serialization(error.to_string())
    }
}

impl From<redis::RedisError> for CacheError {
    fn from(error: redis::RedisError) -> Self {
        if error.is_connection_refusal() || error.is_connection_dropped() || error.is_timeout() {
            CacheError::Connection(error.to_string())
        } else {
            CacheError::Operation(error.to_string())
        }
    }
}
