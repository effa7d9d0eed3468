//! Token service facade for the request layer

use std::sync::Arc;

use chrono::Duration;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::entities::{Claims, Subject, SubjectId, TokenKind, TokenMetadata, TokenPair};
use crate::errors::{AuthError, DomainError, TokenError};
use crate::repositories::{SubjectRepository, TokenStore};

use super::codec::ClaimsCodec;
use super::config::TokenServiceConfig;
use super::issuer::TokenIssuer;
use super::retry::{with_retry, RetryPolicy};
use super::revocation::{RevocationService, REVOKE_REASON_LOGOUT, REVOKE_REASON_ROTATED};
use super::validator::TokenValidator;

/// Issues, validates, rotates and revokes tokens
///
/// Wires the issuer, validator and revocation service over one store and
/// one codec, and adds the subject checks the request layer needs.
pub struct TokenService<S: TokenStore, U: SubjectRepository> {
    codec: Arc<ClaimsCodec>,
    issuer: TokenIssuer<S>,
    validator: TokenValidator<S>,
    revocation: RevocationService<S>,
    subjects: Arc<U>,
    retry: RetryPolicy,
}

impl<S: TokenStore, U: SubjectRepository> TokenService<S, U> {
    /// Creates a new token service
    ///
    /// # Arguments
    ///
    /// * `store` - Token record persistence
    /// * `subjects` - Account lookup for subject checks
    /// * `config` - Signing and lifetime configuration
    ///
    /// # Returns
    ///
    /// * `Ok(TokenService)` - Keys loaded
    /// * `Err(DomainError)` - Key material is missing or invalid
    pub fn new(
        store: Arc<S>,
        subjects: Arc<U>,
        config: TokenServiceConfig,
    ) -> Result<Self, DomainError> {
        let codec = Arc::new(ClaimsCodec::from_config(&config)?);
        Ok(Self::with_codec(store, subjects, codec, config))
    }

    /// Creates a token service around an existing codec
    pub fn with_codec(
        store: Arc<S>,
        subjects: Arc<U>,
        codec: Arc<ClaimsCodec>,
        config: TokenServiceConfig,
    ) -> Self {
        Self {
            issuer: TokenIssuer::new(Arc::clone(&store), Arc::clone(&codec), &config),
            validator: TokenValidator::new(Arc::clone(&store), Arc::clone(&codec), config.retry.clone()),
            revocation: RevocationService::new(store, config.retry.clone()),
            codec,
            subjects,
            retry: config.retry,
        }
    }

    pub fn codec(&self) -> &ClaimsCodec {
        &self.codec
    }

    pub fn issuer(&self) -> &TokenIssuer<S> {
        &self.issuer
    }

    pub fn validator(&self) -> &TokenValidator<S> {
        &self.validator
    }

    pub fn revocation(&self) -> &RevocationService<S> {
        &self.revocation
    }

    /// Issues a new access/refresh pair
    pub async fn issue_pair(
        &self,
        subject: Option<SubjectId>,
        metadata: TokenMetadata,
    ) -> Result<TokenPair, DomainError> {
        self.issuer.issue_pair(subject, metadata).await
    }

    /// Issues a new pair with explicit lifetimes
    pub async fn issue_pair_with_ttl(
        &self,
        subject: Option<SubjectId>,
        metadata: TokenMetadata,
        access_ttl: Duration,
        refresh_ttl: Duration,
    ) -> Result<TokenPair, DomainError> {
        self.issuer
            .issue_pair_with_ttl(subject, metadata, access_ttl, refresh_ttl)
            .await
    }

    /// Validates a token of the given kind
    pub async fn validate(&self, token: &str, required: TokenKind) -> Result<Claims, DomainError> {
        self.validator.validate(token, required).await
    }

    /// Authenticates a request by its access token
    ///
    /// # Returns
    ///
    /// * `Ok((Claims, Option<Subject>))` - Token valid; subject is `None` for anonymous tokens
    /// * `Err(DomainError)` - Token rejected, or subject missing or inactive
    pub async fn authenticate(
        &self,
        access_token: &str,
    ) -> Result<(Claims, Option<Subject>), DomainError> {
        let claims = self.validator.validate(access_token, TokenKind::Access).await?;
        let subject = self.check_subject(&claims).await?;
        Ok((claims, subject))
    }

    /// Exchanges a refresh token for a new pair
    ///
    /// The presented pair is revoked before the new one is issued. Only the
    /// caller whose revocation actually flips the record gets a new pair, so
    /// a refresh token can be spent once even under concurrent use.
    pub async fn refresh(
        &self,
        refresh_token: &str,
        metadata: TokenMetadata,
    ) -> Result<TokenPair, DomainError> {
        let claims = self.validator.validate(refresh_token, TokenKind::Refresh).await?;
        self.check_subject(&claims).await?;

        let revoked = self.revocation.revoke(claims.jti, REVOKE_REASON_ROTATED).await?;
        if revoked == 0 {
            warn!("Refresh token {} was spent concurrently", claims.jti);
            return Err(TokenError::Revoked.into());
        }

        let pair = self.issuer.issue_pair(claims.sub.clone(), metadata).await?;
        info!("Rotated token pair {} -> {}", claims.jti, pair.refresh_id);
        Ok(pair)
    }

    /// Revokes the pair behind an access token
    pub async fn logout(&self, access_token: &str) -> Result<usize, DomainError> {
        let claims = self.validator.validate(access_token, TokenKind::Access).await?;
        self.revocation.revoke(claims.jti, REVOKE_REASON_LOGOUT).await
    }

    /// Revokes a token and its paired token by id
    pub async fn revoke(&self, token_id: Uuid, reason: &str) -> Result<usize, DomainError> {
        self.revocation.revoke(token_id, reason).await
    }

    /// Revokes every token of a subject
    pub async fn revoke_all_for_subject(
        &self,
        subject_id: &SubjectId,
        reason: &str,
    ) -> Result<usize, DomainError> {
        self.revocation.revoke_all_for_subject(subject_id, reason).await
    }

    async fn check_subject(&self, claims: &Claims) -> Result<Option<Subject>, DomainError> {
        let subject_id = match claims.subject() {
            Some(subject_id) => subject_id,
            None => return Ok(None),
        };

        let subject = with_retry(&self.retry, "find_subject", || {
            self.subjects.find_subject(subject_id)
        })
        .await?
        .ok_or(AuthError::SubjectNotFound)?;

        if !subject.is_active {
            return Err(AuthError::SubjectInactive.into());
        }

        Ok(Some(subject))
    }
}
