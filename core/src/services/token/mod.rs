//! Token lifecycle services
//!
//! This module handles everything a paired access/refresh credential goes
//! through:
//! - Signing and verifying the claims envelope (HMAC or RSA keys)
//! - Issuing pairs as one atomic write
//! - Validating presented tokens against their stored record
//! - Revoking pairs, singly or for a whole subject
//! - Periodically reaping records whose retention has elapsed

mod codec;
mod config;
mod issuer;
mod keys;
mod reaper;
mod retry;
mod revocation;
mod service;
mod validator;

#[cfg(test)]
mod tests;

pub use codec::ClaimsCodec;
pub use config::TokenServiceConfig;
pub use issuer::TokenIssuer;
pub use keys::{SigningKeys, MIN_SECRET_BYTES};
pub use reaper::{ExpiryReaper, ExpiryReaperConfig, ReapResult};
pub use retry::{with_retry, RetryPolicy};
pub use revocation::{validate_reason, RevocationService, REVOKE_REASON_LOGOUT, REVOKE_REASON_ROTATED};
pub use service::TokenService;
pub use validator::TokenValidator;
