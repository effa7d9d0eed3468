//! Token validation against signature, kind and stored state

use std::sync::Arc;

use tracing::{debug, warn};

use crate::domain::entities::{Claims, TokenKind};
use crate::errors::{DomainError, TokenError};
use crate::repositories::TokenStore;

use super::codec::ClaimsCodec;
use super::retry::{with_retry, RetryPolicy};

/// Decides whether a presented token is currently honoured
pub struct TokenValidator<S: TokenStore> {
    store: Arc<S>,
    codec: Arc<ClaimsCodec>,
    retry: RetryPolicy,
}

impl<S: TokenStore> TokenValidator<S> {
    pub fn new(store: Arc<S>, codec: Arc<ClaimsCodec>, retry: RetryPolicy) -> Self {
        Self { store, codec, retry }
    }

    /// Validates `token` as a token of kind `required`
    ///
    /// Checks run in a fixed order and stop at the first failure:
    /// 1. signature, shape and expiry
    /// 2. token kind (`WrongType`)
    /// 3. stored record (`UnknownToken` when absent, `Revoked` when revoked)
    ///
    /// A store outage is returned as `StorageFailure`; the token is never
    /// treated as valid when its record cannot be read.
    pub async fn validate(&self, token: &str, required: TokenKind) -> Result<Claims, DomainError> {
        let claims = self.codec.verify(token).map_err(|e| {
            debug!("Token rejected by codec: {}", e);
            e
        })?;

        if claims.typ != required {
            return Err(TokenError::WrongType {
                expected: required,
                actual: claims.typ,
            }
            .into());
        }

        let jti = claims.jti;
        let record = with_retry(&self.retry, "find_by_id", || self.store.find_by_id(jti)).await?;

        let record = match record {
            Some(record) => record,
            None => {
                warn!("Signed token {} has no stored record", jti);
                return Err(TokenError::UnknownToken.into());
            }
        };

        // A record must describe the envelope that names it
        if record.kind != claims.typ || record.subject_id != claims.sub {
            warn!("Stored record {} does not match its envelope", jti);
            return Err(TokenError::UnknownToken.into());
        }

        if record.revoked {
            debug!("Token {} is revoked", jti);
            return Err(TokenError::Revoked.into());
        }

        Ok(claims)
    }
}
