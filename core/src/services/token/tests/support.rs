//! Shared fixtures for token service tests

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use jsonwebtoken::Algorithm;
use uuid::Uuid;

use crate::domain::entities::{Revocation, SubjectId, TokenRecord};
use crate::errors::DomainError;
use crate::repositories::{InMemoryTokenStore, TokenStore};
use crate::services::token::{ClaimsCodec, RetryPolicy, SigningKeys, TokenServiceConfig};

pub const TEST_SECRET: &str = "test-secret-key-that-is-at-least-32-bytes";

pub const TEST_PRIVATE_KEY: &str = include_str!("fixtures/test_private_key.pem");
pub const TEST_PUBLIC_KEY: &str = include_str!("fixtures/test_public_key.pem");

pub fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        base_delay: StdDuration::from_millis(1),
        max_delay: StdDuration::from_millis(2),
        attempt_timeout: StdDuration::from_millis(200),
    }
}

pub fn test_config() -> TokenServiceConfig {
    TokenServiceConfig::default()
        .with_secret(TEST_SECRET)
        .with_retry(fast_retry())
}

pub fn test_codec() -> Arc<ClaimsCodec> {
    Arc::new(ClaimsCodec::from_config(&test_config()).unwrap())
}

pub fn rsa_codec() -> ClaimsCodec {
    let keys = SigningKeys::from_rsa_pem(Algorithm::RS256, TEST_PRIVATE_KEY, TEST_PUBLIC_KEY).unwrap();
    ClaimsCodec::new(keys)
}

/// Replaces one character of the payload segment with a different one
pub fn tamper_payload(token: &str) -> String {
    let mut parts: Vec<String> = token.split('.').map(str::to_string).collect();
    let payload = &mut parts[1];
    let index = payload.len() / 2;
    let original = payload.as_bytes()[index];
    let replacement = if original == b'A' { "B" } else { "A" };
    payload.replace_range(index..index + 1, replacement);
    parts.join(".")
}

/// Token store that can be told to fail or stall its next calls
pub struct FaultyTokenStore {
    pub inner: InMemoryTokenStore,
    failures_left: AtomicU32,
    retryable: bool,
    latency_ms: AtomicU64,
    calls: AtomicU32,
}

impl FaultyTokenStore {
    pub fn healthy() -> Self {
        Self::failing(0, true)
    }

    /// Fails the next `times` calls
    pub fn failing(times: u32, retryable: bool) -> Self {
        Self {
            inner: InMemoryTokenStore::new(),
            failures_left: AtomicU32::new(times),
            retryable,
            latency_ms: AtomicU64::new(0),
            calls: AtomicU32::new(0),
        }
    }

    pub fn fail_next(&self, times: u32) {
        self.failures_left.store(times, Ordering::SeqCst);
    }

    /// Fails every call from now on
    pub fn break_down(&self) {
        self.fail_next(u32::MAX);
    }

    /// Delays every call by `latency` before it runs
    pub fn set_latency(&self, latency: StdDuration) {
        self.latency_ms.store(latency.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn reset_calls(&self) {
        self.calls.store(0, Ordering::SeqCst);
    }

    async fn check(&self) -> Result<(), DomainError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let latency = self.latency_ms.load(Ordering::SeqCst);
        if latency > 0 {
            tokio::time::sleep(StdDuration::from_millis(latency)).await;
        }

        let remaining = self.failures_left.load(Ordering::SeqCst);
        if remaining == 0 {
            return Ok(());
        }
        self.failures_left.store(remaining - 1, Ordering::SeqCst);

        if self.retryable {
            Err(DomainError::transient("connection reset by peer"))
        } else {
            Err(DomainError::storage("table is read-only"))
        }
    }
}

#[async_trait]
impl TokenStore for FaultyTokenStore {
    async fn create_pair(&self, access: &TokenRecord, refresh: &TokenRecord) -> Result<(), DomainError> {
        self.check().await?;
        self.inner.create_pair(access, refresh).await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<TokenRecord>, DomainError> {
        self.check().await?;
        self.inner.find_by_id(id).await
    }

    async fn mark_revoked(&self, ids: &[Uuid], revocation: &Revocation) -> Result<usize, DomainError> {
        self.check().await?;
        self.inner.mark_revoked(ids, revocation).await
    }

    async fn find_unrevoked_by_subject(&self, subject_id: &SubjectId) -> Result<Vec<TokenRecord>, DomainError> {
        self.check().await?;
        self.inner.find_unrevoked_by_subject(subject_id).await
    }

    async fn delete_expired(&self, cutoff: DateTime<Utc>, limit: usize) -> Result<usize, DomainError> {
        self.check().await?;
        self.inner.delete_expired(cutoff, limit).await
    }
}
