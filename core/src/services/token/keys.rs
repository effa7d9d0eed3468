//! Signing key material for the claims codec
//!
//! HMAC algorithms sign with the shared secret; RSA algorithms load a PEM
//! key pair, either from files or from in-memory strings.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey};

use crate::errors::{DomainError, TokenError};

use super::config::TokenServiceConfig;

/// Minimum shared secret length for HMAC signing
pub const MIN_SECRET_BYTES: usize = 32;

#[derive(Debug, Clone)]
enum KeySource {
    Secret,
    Pem,
    Files {
        private_key_path: PathBuf,
        public_key_path: PathBuf,
    },
}

/// Encoding and decoding keys bound to one algorithm
#[derive(Clone)]
pub struct SigningKeys {
    algorithm: Algorithm,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    source: KeySource,
}

impl fmt::Debug for SigningKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKeys")
            .field("algorithm", &self.algorithm)
            .field("source", &self.source)
            .finish()
    }
}

fn key_error(message: String) -> DomainError {
    DomainError::Token(TokenError::KeyLoadError { message })
}

fn is_hmac(algorithm: Algorithm) -> bool {
    matches!(algorithm, Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512)
}

fn is_rsa(algorithm: Algorithm) -> bool {
    matches!(
        algorithm,
        Algorithm::RS256
            | Algorithm::RS384
            | Algorithm::RS512
            | Algorithm::PS256
            | Algorithm::PS384
            | Algorithm::PS512
    )
}

impl SigningKeys {
    /// Creates HMAC keys from a shared secret
    ///
    /// # Returns
    ///
    /// * `Ok(SigningKeys)` - Keys ready for signing and verification
    /// * `Err(DomainError)` - Non-HMAC algorithm or secret too short
    pub fn from_secret(algorithm: Algorithm, secret: &[u8]) -> Result<Self, DomainError> {
        if !is_hmac(algorithm) {
            return Err(key_error(format!(
                "{:?} does not sign with a shared secret",
                algorithm
            )));
        }
        if secret.len() < MIN_SECRET_BYTES {
            return Err(key_error(format!(
                "Shared secret must be at least {} bytes",
                MIN_SECRET_BYTES
            )));
        }

        Ok(Self {
            algorithm,
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            source: KeySource::Secret,
        })
    }

    /// Creates RSA keys from PEM strings (useful for testing or embedded keys)
    pub fn from_rsa_pem(
        algorithm: Algorithm,
        private_key_pem: &str,
        public_key_pem: &str,
    ) -> Result<Self, DomainError> {
        let (encoding_key, decoding_key) =
            Self::parse_rsa(algorithm, private_key_pem.as_bytes(), public_key_pem.as_bytes())?;

        Ok(Self {
            algorithm,
            encoding_key,
            decoding_key,
            source: KeySource::Pem,
        })
    }

    /// Loads RSA keys from PEM files
    ///
    /// # Arguments
    ///
    /// * `private_key_path` - Path to the PEM-encoded private key file
    /// * `public_key_path` - Path to the PEM-encoded public key file
    pub fn from_rsa_files<P: AsRef<Path>>(
        algorithm: Algorithm,
        private_key_path: P,
        public_key_path: P,
    ) -> Result<Self, DomainError> {
        let private_key_path = private_key_path.as_ref().to_path_buf();
        let public_key_path = public_key_path.as_ref().to_path_buf();

        let private_key_pem = fs::read(&private_key_path)
            .map_err(|e| key_error(format!("Failed to read private key: {}", e)))?;
        let public_key_pem = fs::read(&public_key_path)
            .map_err(|e| key_error(format!("Failed to read public key: {}", e)))?;

        let (encoding_key, decoding_key) =
            Self::parse_rsa(algorithm, &private_key_pem, &public_key_pem)?;

        Ok(Self {
            algorithm,
            encoding_key,
            decoding_key,
            source: KeySource::Files {
                private_key_path,
                public_key_path,
            },
        })
    }

    /// Picks the key source matching the configured algorithm
    pub fn from_config(config: &TokenServiceConfig) -> Result<Self, DomainError> {
        if is_hmac(config.algorithm) {
            return Self::from_secret(config.algorithm, config.jwt_secret.as_bytes());
        }

        match (&config.private_key_path, &config.public_key_path) {
            (Some(private_key_path), Some(public_key_path)) => {
                Self::from_rsa_files(config.algorithm, private_key_path, public_key_path)
            }
            _ => Err(key_error(format!(
                "{:?} requires both a private and a public key path",
                config.algorithm
            ))),
        }
    }

    fn parse_rsa(
        algorithm: Algorithm,
        private_key_pem: &[u8],
        public_key_pem: &[u8],
    ) -> Result<(EncodingKey, DecodingKey), DomainError> {
        if !is_rsa(algorithm) {
            return Err(key_error(format!("{:?} is not an RSA algorithm", algorithm)));
        }

        let encoding_key = EncodingKey::from_rsa_pem(private_key_pem)
            .map_err(|e| key_error(format!("Invalid private key format: {}", e)))?;
        let decoding_key = DecodingKey::from_rsa_pem(public_key_pem)
            .map_err(|e| key_error(format!("Invalid public key format: {}", e)))?;

        Ok((encoding_key, decoding_key))
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn encoding_key(&self) -> &EncodingKey {
        &self.encoding_key
    }

    pub fn decoding_key(&self) -> &DecodingKey {
        &self.decoding_key
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_secret_rejects_short_secret() {
        let err = SigningKeys::from_secret(Algorithm::HS256, b"too-short").unwrap_err();
        assert_eq!(err.code(), "KEY_LOAD_ERROR");
    }

    #[test]
    fn test_from_secret_rejects_rsa_algorithm() {
        let secret = [7u8; 32];
        assert!(SigningKeys::from_secret(Algorithm::RS256, &secret).is_err());
    }

    #[test]
    fn test_from_config_requires_key_paths_for_rsa() {
        let config = TokenServiceConfig {
            algorithm: Algorithm::RS256,
            ..TokenServiceConfig::default()
        };
        assert!(SigningKeys::from_config(&config).is_err());
    }

    #[test]
    fn test_missing_key_file() {
        let err = SigningKeys::from_rsa_files(
            Algorithm::RS256,
            "/nonexistent/private.pem",
            "/nonexistent/public.pem",
        )
        .unwrap_err();
        assert!(err.to_string().contains("Failed to read private key"));
    }

    #[test]
    fn test_invalid_pem() {
        assert!(SigningKeys::from_rsa_pem(Algorithm::RS256, "not a key", "not a key").is_err());
    }

    #[test]
    fn test_debug_hides_key_material() {
        let keys = SigningKeys::from_secret(Algorithm::HS256, &[1u8; 32]).unwrap();
        let printed = format!("{:?}", keys);
        assert!(printed.contains("HS256"));
        assert!(printed.contains("Secret"));
    }
}
