//! Configuration for the token service

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::Duration;
use fb_shared::config::JwtConfig;
use jsonwebtoken::Algorithm;

use crate::errors::{DomainError, TokenError};

use super::retry::RetryPolicy;

/// Configuration for the token service
#[derive(Clone)]
pub struct TokenServiceConfig {
    /// Shared secret for HMAC algorithms
    pub jwt_secret: String,
    /// JWT signing algorithm
    pub algorithm: Algorithm,
    /// Lifetime of access tokens
    pub access_token_ttl: Duration,
    /// Lifetime of refresh tokens
    pub refresh_token_ttl: Duration,
    /// PEM private key, RSA algorithms only
    pub private_key_path: Option<PathBuf>,
    /// PEM public key, RSA algorithms only
    pub public_key_path: Option<PathBuf>,
    /// Retry behaviour for store calls
    pub retry: RetryPolicy,
}

impl Default for TokenServiceConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "fastbin-development-secret-change-in-production".to_string(),
            algorithm: Algorithm::HS256,
            access_token_ttl: Duration::minutes(30),
            refresh_token_ttl: Duration::days(7),
            private_key_path: None,
            public_key_path: None,
            retry: RetryPolicy::default(),
        }
    }
}

// Keep the secret out of logs
impl fmt::Debug for TokenServiceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenServiceConfig")
            .field("jwt_secret", &"<redacted>")
            .field("algorithm", &self.algorithm)
            .field("access_token_ttl", &self.access_token_ttl)
            .field("refresh_token_ttl", &self.refresh_token_ttl)
            .field("private_key_path", &self.private_key_path)
            .field("public_key_path", &self.public_key_path)
            .field("retry", &self.retry)
            .finish()
    }
}

fn lifetime(seconds: i64) -> Result<Duration, DomainError> {
    Duration::try_seconds(seconds).ok_or_else(|| DomainError::Validation {
        message: format!("token lifetime of {}s is out of range", seconds),
    })
}

impl TokenServiceConfig {
    /// Builds a service config from the application's JWT settings
    ///
    /// # Returns
    ///
    /// * `Ok(TokenServiceConfig)` - Settings are usable
    /// * `Err(DomainError)` - Unknown algorithm or invalid settings
    pub fn from_jwt_config(jwt: &JwtConfig) -> Result<Self, DomainError> {
        jwt.validate()
            .map_err(|message| DomainError::Validation { message })?;

        let algorithm = Algorithm::from_str(&jwt.algorithm).map_err(|_| {
            DomainError::Token(TokenError::KeyLoadError {
                message: format!("Unsupported JWT algorithm: {}", jwt.algorithm),
            })
        })?;

        Ok(Self {
            jwt_secret: jwt.secret.clone(),
            algorithm,
            access_token_ttl: lifetime(jwt.access_token_expiry)?,
            refresh_token_ttl: lifetime(jwt.refresh_token_expiry)?,
            private_key_path: jwt.private_key_path.as_ref().map(PathBuf::from),
            public_key_path: jwt.public_key_path.as_ref().map(PathBuf::from),
            retry: RetryPolicy::default(),
        })
    }

    /// Sets the shared secret
    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.jwt_secret = secret.into();
        self
    }

    /// Sets both token lifetimes
    pub fn with_ttls(mut self, access: Duration, refresh: Duration) -> Self {
        self.access_token_ttl = access;
        self.refresh_token_ttl = refresh;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}
