//! Token signing and lifetime configuration

use serde::{Deserialize, Serialize};

use super::env_or;

const DEFAULT_SECRET: &str = "fastbin-development-secret-change-in-production";

/// Minimum secret length accepted for HMAC algorithms
pub const MIN_SECRET_LENGTH: usize = 32;

/// Longest token lifetime accepted (ten years)
pub const MAX_TOKEN_LIFETIME_SECONDS: i64 = 10 * 365 * 24 * 3600;

/// JWT configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct JwtConfig {
    /// Shared secret for HMAC signing
    pub secret: String,

    /// Access token lifetime in seconds
    pub access_token_expiry: i64,

    /// Refresh token lifetime in seconds
    pub refresh_token_expiry: i64,

    /// Signing algorithm name (default: HS256)
    #[serde(default = "default_algorithm")]
    pub algorithm: String,

    /// PEM private key path, used by RSA algorithms
    #[serde(default)]
    pub private_key_path: Option<String>,

    /// PEM public key path, used by RSA algorithms
    #[serde(default)]
    pub public_key_path: Option<String>,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: String::from(DEFAULT_SECRET),
            access_token_expiry: 1800,    // 30 minutes
            refresh_token_expiry: 604800, // 7 days
            algorithm: default_algorithm(),
            private_key_path: None,
            public_key_path: None,
        }
    }
}

impl JwtConfig {
    /// Create a new JWT configuration with secret
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            ..Default::default()
        }
    }

    /// Load JWT settings from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            secret: std::env::var("JWT_SECRET").unwrap_or(defaults.secret),
            access_token_expiry: env_or("ACCESS_TOKEN_EXPIRE_SECONDS", defaults.access_token_expiry),
            refresh_token_expiry: env_or("REFRESH_TOKEN_EXPIRE_SECONDS", defaults.refresh_token_expiry),
            algorithm: std::env::var("JWT_ALGORITHM").unwrap_or(defaults.algorithm),
            private_key_path: std::env::var("JWT_PRIVATE_KEY_PATH").ok(),
            public_key_path: std::env::var("JWT_PUBLIC_KEY_PATH").ok(),
        }
    }

    /// Set access token expiry in minutes
    pub fn with_access_expiry_minutes(mut self, minutes: i64) -> Self {
        self.access_token_expiry = minutes * 60;
        self
    }

    /// Set refresh token expiry in days
    pub fn with_refresh_expiry_days(mut self, days: i64) -> Self {
        self.refresh_token_expiry = days * 86400;
        self
    }

    /// Set the signing algorithm
    pub fn with_algorithm(mut self, algorithm: impl Into<String>) -> Self {
        self.algorithm = algorithm.into();
        self
    }

    /// Check if using default secret (security warning)
    pub fn is_using_default_secret(&self) -> bool {
        self.secret == DEFAULT_SECRET
    }

    /// Whether the configured algorithm signs with the shared secret
    pub fn uses_shared_secret(&self) -> bool {
        self.algorithm.to_uppercase().starts_with("HS")
    }

    /// Validate lifetimes and key material
    pub fn validate(&self) -> Result<(), String> {
        if self.access_token_expiry <= 0 || self.refresh_token_expiry <= 0 {
            return Err("token lifetimes must be positive".to_string());
        }
        if self.access_token_expiry > MAX_TOKEN_LIFETIME_SECONDS
            || self.refresh_token_expiry > MAX_TOKEN_LIFETIME_SECONDS
        {
            return Err(format!(
                "token lifetimes cannot exceed {} seconds",
                MAX_TOKEN_LIFETIME_SECONDS
            ));
        }
        if self.uses_shared_secret() && self.secret.len() < MIN_SECRET_LENGTH {
            return Err(format!(
                "JWT secret must be at least {} bytes",
                MIN_SECRET_LENGTH
            ));
        }
        if !self.uses_shared_secret()
            && (self.private_key_path.is_none() || self.public_key_path.is_none())
        {
            return Err(format!(
                "{} requires JWT_PRIVATE_KEY_PATH and JWT_PUBLIC_KEY_PATH",
                self.algorithm
            ));
        }
        Ok(())
    }
}

/// Complete authentication configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AuthConfig {
    /// JWT configuration
    pub jwt: JwtConfig,
}

impl AuthConfig {
    /// Load authentication settings from environment variables
    pub fn from_env() -> Self {
        Self {
            jwt: JwtConfig::from_env(),
        }
    }
}

fn default_algorithm() -> String {
    String::from("HS256")
}
