//! Domain error types

use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Invalid load request: {0}")]
    InvalidLoadRequest(String),

    #[error("Invalid model path: {0}")]
    InvalidModelPath(String),
}

impl DomainError {
    /// Check if this error was raised by load-request validation
    pub fn is_invalid_request(&self) -> bool {
        matches!(
            self,
            DomainError::InvalidLoadRequest(_) | DomainError::InvalidModelPath(_)
        )
    }
}
