use keyspan_core::{Cancelled, StorageError};
use keyspan_generator::GeneratorError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ShortenerError>;

#[derive(Debug, Error)]
pub enum ShortenerError {
    #[error("failed to allocate a short code: {0}")]
    AllocationFailed(#[source] GeneratorError),
    #[error("failed to store link: {0}")]
    CreateFailed(#[source] StorageError),
    #[error("short code not found: {0}")]
    NotFound(String),
    #[error("storage error: {0}")]
    Storage(#[source] StorageError),
    #[error("operation cancelled")]
    Cancelled,
    #[error("invalid url: {0}")]
    InvalidUrl(String),
}

impl ShortenerError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ShortenerError::NotFound(_))
    }
}

impl From<Cancelled> for ShortenerError {
    fn from(_: Cancelled) -> Self {
        ShortenerError::Cancelled
    }
}

impl From<GeneratorError> for ShortenerError {
    fn from(value: GeneratorError) -> Self {
        match value {
            GeneratorError::Cancelled => ShortenerError::Cancelled,
            other => ShortenerError::AllocationFailed(other),
        }
    }
}
