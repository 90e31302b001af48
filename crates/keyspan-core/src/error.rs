use std::time::Duration;
use thiserror::Error;

/// Errors related to the core types of the shortener.
pub type Result<T> = std::result::Result<T, CoreError>;

#[derive(Debug, Clone, Error)]
pub enum CoreError {
    #[error("invalid short code: {0}")]
    InvalidShortCode(String),
}

#[derive(Debug, Clone, Error)]
pub enum CacheError {
    #[error("cache backend unavailable: {0}")]
    Unavailable(String),
    #[error("cache operation timed out: {0}")]
    Timeout(String),
    #[error("cache serialization failed: {0}")]
    Serialization(String),
    #[error("cache value is invalid: {0}")]
    InvalidData(String),
    #[error("cache initialization failed: {0}")]
    Initialization(String),
    #[error("cache operation failed: {0}")]
    Operation(String),
}

#[derive(Debug, Clone, Error)]
pub enum StorageError {
    #[error("short code already exists: {0}")]
    Conflict(String),
    #[error("short code not found: {0}")]
    NotFound(String),
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
    #[error("storage operation timed out: {0}")]
    Timeout(String),
    #[error("storage query failed: {0}")]
    Query(String),
    #[error("stored data is invalid: {0}")]
    InvalidData(String),
    #[error("storage operation failed: {0}")]
    Operation(String),
}

impl StorageError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound(_))
    }
}

/// Errors raised while talking to the coordination service.
#[derive(Debug, Clone, Error)]
pub enum CoordinationError {
    #[error("lock '{name}' not acquired within {timeout:?}")]
    LockTimeout { name: String, timeout: Duration },
    #[error("coordination store i/o failed: {0}")]
    Io(String),
    #[error("coordination store holds invalid data: {0}")]
    InvalidData(String),
    #[error("lease on lock '{name}' lapsed before the write")]
    LeaseLost { name: String },
    #[error("coordination cancelled")]
    Cancelled,
}

impl CoordinationError {
    /// Whether retrying the same call later may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CoordinationError::LockTimeout { .. }
                | CoordinationError::Io(_)
                | CoordinationError::LeaseLost { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lost_lease_is_retryable() {
        let err = CoordinationError::LeaseLost {
            name: "/locker".to_string(),
        };
        assert!(err.is_retryable());
        assert!(!CoordinationError::InvalidData("x".to_string()).is_retryable());
        assert!(!CoordinationError::Cancelled.is_retryable());
    }
}
