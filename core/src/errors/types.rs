//! Error types for token handling and subject lookup
//!
//! Every failure the token subsystem can report is one of these variants;
//! the request layer maps them to transport responses through `code()`.

use thiserror::Error;

use crate::domain::entities::TokenKind;

/// Subject lookup errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Subject not found")]
    SubjectNotFound,

    #[error("Subject is not active")]
    SubjectInactive,
}

impl AuthError {
    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::SubjectNotFound => "SUBJECT_NOT_FOUND",
            AuthError::SubjectInactive => "SUBJECT_INACTIVE",
        }
    }
}

/// Token-related errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// Envelope cannot be parsed into the expected claim shape
    #[error("Malformed token")]
    Malformed,

    /// Cryptographic check failed
    #[error("Invalid signature")]
    BadSignature,

    #[error("Token expired")]
    Expired,

    #[error("Wrong token type: expected {expected}, got {actual}")]
    WrongType {
        expected: TokenKind,
        actual: TokenKind,
    },

    #[error("Token revoked")]
    Revoked,

    /// Signature-valid claims with no matching record
    #[error("Unknown token")]
    UnknownToken,

    #[error("Storage failure: {message}")]
    StorageFailure { message: String, retryable: bool },

    #[error("Token signing failed")]
    SigningFailed,

    #[error("Key load error: {message}")]
    KeyLoadError { message: String },
}

impl TokenError {
    /// Storage failure that may succeed on another attempt
    pub fn transient(message: impl Into<String>) -> Self {
        TokenError::StorageFailure {
            message: message.into(),
            retryable: true,
        }
    }

    /// Storage failure that will not succeed on retry
    pub fn storage(message: impl Into<String>) -> Self {
        TokenError::StorageFailure {
            message: message.into(),
            retryable: false,
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, TokenError::StorageFailure { retryable: true, .. })
    }

    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            TokenError::Malformed => "TOKEN_MALFORMED",
            TokenError::BadSignature => "TOKEN_BAD_SIGNATURE",
            TokenError::Expired => "TOKEN_EXPIRED",
            TokenError::WrongType { .. } => "TOKEN_WRONG_TYPE",
            TokenError::Revoked => "TOKEN_REVOKED",
            TokenError::UnknownToken => "TOKEN_UNKNOWN",
            TokenError::StorageFailure { .. } => "STORAGE_FAILURE",
            TokenError::SigningFailed => "TOKEN_SIGNING_FAILED",
            TokenError::KeyLoadError { .. } => "KEY_LOAD_ERROR",
        }
    }
}
