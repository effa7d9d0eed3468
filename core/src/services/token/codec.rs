//! Signed envelope encoding for token claims
//!
//! The codec never looks at claim values before the signature has been
//! verified. Expiry is checked by the codec itself because the boundary is
//! inclusive: a token whose `exp` equals the current second is expired.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Header, Validation};
use tracing::debug;

use crate::domain::entities::Claims;
use crate::errors::{DomainError, TokenError};

use super::config::TokenServiceConfig;
use super::keys::SigningKeys;

/// Signs and verifies token claims with one key set
#[derive(Debug, Clone)]
pub struct ClaimsCodec {
    keys: SigningKeys,
    validation: Validation,
}

impl ClaimsCodec {
    pub fn new(keys: SigningKeys) -> Self {
        let mut validation = Validation::new(keys.algorithm());
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.leeway = 0;
        validation.required_spec_claims = HashSet::new();

        Self { keys, validation }
    }

    /// Loads keys for the configured algorithm and builds a codec
    pub fn from_config(config: &TokenServiceConfig) -> Result<Self, DomainError> {
        Ok(Self::new(SigningKeys::from_config(config)?))
    }

    pub fn keys(&self) -> &SigningKeys {
        &self.keys
    }

    /// Signs claims into a compact token string
    pub fn sign(&self, claims: &Claims) -> Result<String, TokenError> {
        let header = Header::new(self.keys.algorithm());
        encode(&header, claims, self.keys.encoding_key()).map_err(|e| {
            debug!("Failed to sign claims {}: {}", claims.jti, e);
            TokenError::SigningFailed
        })
    }

    /// Verifies a token against the current time
    ///
    /// # Returns
    ///
    /// * `Ok(Claims)` - Signature is valid and the token has not expired
    /// * `Err(TokenError::Malformed)` - Not a token, or claims of the wrong shape
    /// * `Err(TokenError::BadSignature)` - Signature or algorithm mismatch
    /// * `Err(TokenError::Expired)` - `now >= exp`
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        self.verify_at(token, Utc::now())
    }

    /// Verifies a token against an explicit point in time
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, TokenError> {
        let data = decode::<Claims>(token, self.keys.decoding_key(), &self.validation)
            .map_err(|e| classify(e.kind()))?;
        let claims = data.claims;

        if claims.exp <= claims.iat {
            return Err(TokenError::Malformed);
        }
        if claims.is_expired_at(now) {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }
}

fn classify(kind: &ErrorKind) -> TokenError {
    match kind {
        ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => TokenError::BadSignature,
        ErrorKind::ExpiredSignature => TokenError::Expired,
        _ => TokenError::Malformed,
    }
}
