//! Domain entities representing core business objects.

pub mod subject;
pub mod token;

// Re-export commonly used types
pub use subject::{Subject, SubjectId};
pub use token::{
    Claims, Revocation, TokenKind, TokenMetadata, TokenPair, TokenRecord, MAX_REVOKE_REASON_LENGTH,
    TOKEN_TYPE_BEARER,
};
