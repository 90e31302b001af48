use keyspan_core::{Cancelled, CoordinationError};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, GeneratorError>;

#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("failed to claim an interval: {0}")]
    Coordination(#[from] CoordinationError),

    #[error("interval for counter value {value} with size {size} exceeds the code space")]
    IntervalOverflow { value: u64, size: u64 },

    #[error("code generation cancelled")]
    Cancelled,
}

impl From<Cancelled> for GeneratorError {
    fn from(_: Cancelled) -> Self {
        GeneratorError::Cancelled
    }
}

impl GeneratorError {
    /// Whether calling again may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            GeneratorError::Coordination(e) => e.is_retryable(),
            GeneratorError::IntervalOverflow { .. } => false,
            GeneratorError::Cancelled => false,
        }
    }
}
