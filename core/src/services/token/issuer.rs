//! Token pair issuance

use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{error, info};

use fb_shared::config::MAX_TOKEN_LIFETIME_SECONDS;

use crate::domain::entities::{SubjectId, TokenMetadata, TokenPair, TokenRecord};
use crate::errors::DomainError;
use crate::repositories::TokenStore;

use super::codec::ClaimsCodec;
use super::config::TokenServiceConfig;
use super::retry::{with_retry, RetryPolicy};

/// Creates linked access/refresh pairs
///
/// Both envelopes are signed before anything is written, and both records
/// are persisted in one atomic store call, so a failure leaves no trace.
pub struct TokenIssuer<S: TokenStore> {
    store: Arc<S>,
    codec: Arc<ClaimsCodec>,
    access_token_ttl: Duration,
    refresh_token_ttl: Duration,
    retry: RetryPolicy,
}

impl<S: TokenStore> TokenIssuer<S> {
    pub fn new(store: Arc<S>, codec: Arc<ClaimsCodec>, config: &TokenServiceConfig) -> Self {
        Self {
            store,
            codec,
            access_token_ttl: config.access_token_ttl,
            refresh_token_ttl: config.refresh_token_ttl,
            retry: config.retry.clone(),
        }
    }

    /// Issues a pair with the configured lifetimes
    pub async fn issue_pair(
        &self,
        subject: Option<SubjectId>,
        metadata: TokenMetadata,
    ) -> Result<TokenPair, DomainError> {
        self.issue_pair_with_ttl(subject, metadata, self.access_token_ttl, self.refresh_token_ttl)
            .await
    }

    /// Issues a pair with explicit lifetimes
    ///
    /// # Arguments
    ///
    /// * `subject` - Principal the pair represents, `None` for anonymous
    /// * `metadata` - Free-form attributes stored with both records
    /// * `access_ttl` - Access token lifetime, at least one second
    /// * `refresh_ttl` - Refresh token lifetime, at least one second
    ///
    /// Both lifetimes are capped at `MAX_TOKEN_LIFETIME_SECONDS`.
    ///
    /// # Returns
    ///
    /// * `Ok(TokenPair)` - Both tokens are signed and both records persisted
    /// * `Err(DomainError)` - Nothing was persisted
    pub async fn issue_pair_with_ttl(
        &self,
        subject: Option<SubjectId>,
        metadata: TokenMetadata,
        access_ttl: Duration,
        refresh_ttl: Duration,
    ) -> Result<TokenPair, DomainError> {
        // Claims carry whole seconds, so a sub-second lifetime would sign exp == iat
        if access_ttl < Duration::seconds(1) || refresh_ttl < Duration::seconds(1) {
            return Err(DomainError::Validation {
                message: "token lifetimes must be at least one second".to_string(),
            });
        }

        let max_ttl = Duration::seconds(MAX_TOKEN_LIFETIME_SECONDS);
        if access_ttl > max_ttl || refresh_ttl > max_ttl {
            return Err(DomainError::Validation {
                message: format!(
                    "token lifetimes cannot exceed {} seconds",
                    MAX_TOKEN_LIFETIME_SECONDS
                ),
            });
        }

        let (access, refresh) =
            TokenRecord::new_pair(subject, metadata, Utc::now(), access_ttl, refresh_ttl)
                .map_err(|message| DomainError::Validation { message })?;

        let access_token = self.codec.sign(&access.claims())?;
        let refresh_token = self.codec.sign(&refresh.claims())?;

        with_retry(&self.retry, "create_pair", || {
            self.store.create_pair(&access, &refresh)
        })
        .await
        .map_err(|e| {
            error!("Failed to persist token pair {}/{}: {}", access.id, refresh.id, e);
            e
        })?;

        info!(
            access_id = %access.id,
            refresh_id = %refresh.id,
            subject = ?access.subject_id,
            "Issued token pair"
        );

        Ok(TokenPair::new(access_token, refresh_token, &access, &refresh))
    }
}
