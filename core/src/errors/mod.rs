//! Domain-specific error types and error handling.

mod types;


pub use types::{AuthError, TokenError};

use thiserror::Error;

/// Core domain errors (general purpose)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },

    // Bridge to specific error types
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Token(#[from] TokenError),
}

impl DomainError {
    /// Shorthand for a retryable storage failure
    pub fn transient(message: impl Into<String>) -> Self {
        DomainError::Token(TokenError::transient(message))
    }

    /// Shorthand for a permanent storage failure
    pub fn storage(message: impl Into<String>) -> Self {
        DomainError::Token(TokenError::storage(message))
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, DomainError::Token(e) if e.is_retryable())
    }

    pub fn is_storage_failure(&self) -> bool {
        matches!(self, DomainError::Token(TokenError::StorageFailure { .. }))
    }

    /// The token error behind this error, if any
    pub fn token_error(&self) -> Option<&TokenError> {
        match self {
            DomainError::Token(e) => Some(e),
            _ => None,
        }
    }

    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            DomainError::Validation { .. } => "VALIDATION_ERROR",
            DomainError::Internal { .. } => "INTERNAL_ERROR",
            DomainError::Auth(e) => e.code(),
            DomainError::Token(e) => e.code(),
        }
    }
}

pub type DomainResult<T> = Result<T, DomainError>;
