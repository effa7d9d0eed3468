//! Unit tests for revocation and its pair cascade

use std::sync::Arc;

use chrono::{Duration, Utc};
use uuid::Uuid;

use super::support::{fast_retry, test_codec, test_config, FaultyTokenStore};
use crate::domain::entities::{SubjectId, TokenMetadata, TokenPair, TokenRecord};
use crate::errors::DomainError;
use crate::repositories::TokenStore;
use crate::services::token::{RevocationService, TokenIssuer};

struct Fixture {
    store: Arc<FaultyTokenStore>,
    issuer: TokenIssuer<FaultyTokenStore>,
    revocation: RevocationService<FaultyTokenStore>,
}

impl Fixture {
    fn new() -> Self {
        let store = Arc::new(FaultyTokenStore::healthy());
        Self {
            issuer: TokenIssuer::new(Arc::clone(&store), test_codec(), &test_config()),
            revocation: RevocationService::new(Arc::clone(&store), fast_retry()),
            store,
        }
    }

    async fn pair_for(&self, subject: i64) -> TokenPair {
        self.issuer
            .issue_pair(Some(SubjectId::from(subject)), TokenMetadata::new())
            .await
            .unwrap()
    }

    async fn record(&self, id: Uuid) -> TokenRecord {
        self.store.inner.find_by_id(id).await.unwrap().unwrap()
    }
}

#[tokio::test]
async fn test_revoking_access_cascades_to_refresh() {
    let fx = Fixture::new();
    let pair = fx.pair_for(42).await;

    let revoked = fx.revocation.revoke(pair.access_id, "logout").await.unwrap();
    assert_eq!(revoked, 2);

    let access = fx.record(pair.access_id).await;
    let refresh = fx.record(pair.refresh_id).await;
    assert!(access.revoked && refresh.revoked);
    assert_eq!(access.revoke_reason.as_deref(), Some("logout"));
    assert_eq!(refresh.revoke_reason.as_deref(), Some("logout"));
    assert_eq!(access.revoked_at, refresh.revoked_at);
}

#[tokio::test]
async fn test_revoking_refresh_cascades_to_access() {
    let fx = Fixture::new();
    let pair = fx.pair_for(42).await;

    assert_eq!(fx.revocation.revoke(pair.refresh_id, "compromised").await.unwrap(), 2);
    assert!(fx.record(pair.access_id).await.revoked);
}

#[tokio::test]
async fn test_revoke_is_idempotent() {
    let fx = Fixture::new();
    let pair = fx.pair_for(42).await;

    fx.revocation.revoke(pair.access_id, "first").await.unwrap();
    let first = fx.record(pair.access_id).await;

    assert_eq!(fx.revocation.revoke(pair.access_id, "second").await.unwrap(), 0);
    assert_eq!(fx.revocation.revoke(pair.refresh_id, "third").await.unwrap(), 0);

    let after = fx.record(pair.access_id).await;
    assert_eq!(after.revoked_at, first.revoked_at);
    assert_eq!(after.revoke_reason.as_deref(), Some("first"));
}

#[tokio::test]
async fn test_unknown_id_is_noop() {
    let fx = Fixture::new();
    let pair = fx.pair_for(42).await;

    assert_eq!(fx.revocation.revoke(Uuid::new_v4(), "logout").await.unwrap(), 0);
    assert!(!fx.record(pair.access_id).await.revoked);
}

#[tokio::test]
async fn test_orphan_record_revoked_alone() {
    let fx = Fixture::new();
    let pair = fx.pair_for(42).await;
    fx.store.inner.remove(pair.refresh_id).await;

    assert_eq!(fx.revocation.revoke(pair.access_id, "logout").await.unwrap(), 1);
    assert!(fx.record(pair.access_id).await.revoked);
}

#[tokio::test]
async fn test_reason_length_limit() {
    let fx = Fixture::new();
    let pair = fx.pair_for(42).await;

    let too_long = "x".repeat(301);
    let result = fx.revocation.revoke(pair.access_id, &too_long).await;
    assert!(matches!(result, Err(DomainError::Validation { .. })));
    assert!(!fx.record(pair.access_id).await.revoked);

    let result = fx.revocation.revoke_all_for_subject(&SubjectId::from(42), &too_long).await;
    assert!(matches!(result, Err(DomainError::Validation { .. })));

    let at_limit = "x".repeat(300);
    assert_eq!(fx.revocation.revoke(pair.access_id, &at_limit).await.unwrap(), 2);
}

#[tokio::test]
async fn test_revoke_all_for_subject() {
    let fx = Fixture::new();
    let mut pairs = Vec::new();
    for _ in 0..3 {
        pairs.push(fx.pair_for(42).await);
    }
    let other = fx.pair_for(7).await;

    let revoked = fx
        .revocation
        .revoke_all_for_subject(&SubjectId::from(42), "password_change")
        .await
        .unwrap();
    assert_eq!(revoked, 6);

    for pair in &pairs {
        let access = fx.record(pair.access_id).await;
        assert!(access.revoked);
        assert_eq!(access.revoke_reason.as_deref(), Some("password_change"));
        assert!(fx.record(pair.refresh_id).await.revoked);
    }
    assert!(!fx.record(other.access_id).await.revoked);
    assert!(!fx.record(other.refresh_id).await.revoked);
    assert_eq!(
        fx.store.count_unrevoked_for_subject(&SubjectId::from(42)).await.unwrap(),
        0
    );
}

#[tokio::test]
async fn test_revoke_all_counts_only_new_transitions() {
    let fx = Fixture::new();
    let first = fx.pair_for(42).await;
    fx.pair_for(42).await;
    fx.revocation.revoke(first.refresh_id, "logout").await.unwrap();

    let revoked = fx
        .revocation
        .revoke_all_for_subject(&SubjectId::from(42), "admin")
        .await
        .unwrap();
    assert_eq!(revoked, 2);
    assert_eq!(
        fx.record(first.access_id).await.revoke_reason.as_deref(),
        Some("logout")
    );

    // Nothing left to revoke
    assert_eq!(
        fx.revocation
            .revoke_all_for_subject(&SubjectId::from(42), "admin")
            .await
            .unwrap(),
        0
    );
}

#[tokio::test]
async fn test_revoke_all_includes_expired_records() {
    let fx = Fixture::new();
    let (access, refresh) = TokenRecord::new_pair(
        Some(SubjectId::from(42)),
        TokenMetadata::new(),
        Utc::now() - Duration::days(1),
        Duration::minutes(30),
        Duration::hours(1),
    )
    .unwrap();
    fx.store.inner.create_pair(&access, &refresh).await.unwrap();

    let revoked = fx
        .revocation
        .revoke_all_for_subject(&SubjectId::from(42), "admin")
        .await
        .unwrap();
    assert_eq!(revoked, 2);
}

#[tokio::test]
async fn test_storage_failure_is_reported() {
    let fx = Fixture::new();
    let pair = fx.pair_for(42).await;
    fx.store.break_down();

    let err = fx.revocation.revoke(pair.access_id, "logout").await.unwrap_err();
    assert!(err.is_storage_failure());

    let err = fx
        .revocation
        .revoke_all_for_subject(&SubjectId::from(42), "logout")
        .await
        .unwrap_err();
    assert!(err.is_storage_failure());
}

#[tokio::test]
async fn test_concurrent_revocations_transition_once() {
    let fx = Arc::new(Fixture::new());
    let pair = fx.pair_for(42).await;

    let mut handles = Vec::new();
    for i in 0..8 {
        let fx = Arc::clone(&fx);
        let id = if i % 2 == 0 { pair.access_id } else { pair.refresh_id };
        handles.push(tokio::spawn(async move {
            fx.revocation.revoke(id, "race").await.unwrap()
        }));
    }

    let mut total = 0;
    for handle in handles {
        total += handle.await.unwrap();
    }
    assert_eq!(total, 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_revoke_racing_revoke_all_agree_on_pair_state() {
    let fx = Arc::new(Fixture::new());

    for _ in 0..20 {
        let pair = fx.pair_for(42).await;

        let refresh_id = pair.refresh_id;
        let by_id = {
            let fx = Arc::clone(&fx);
            tokio::spawn(async move { fx.revocation.revoke(refresh_id, "a").await.unwrap() })
        };
        let by_subject = {
            let fx = Arc::clone(&fx);
            tokio::spawn(async move {
                fx.revocation
                    .revoke_all_for_subject(&SubjectId::from(42), "b")
                    .await
                    .unwrap()
            })
        };
        by_id.await.unwrap();
        by_subject.await.unwrap();

        let access = fx.record(pair.access_id).await;
        let refresh = fx.record(pair.refresh_id).await;
        assert!(access.revoked && refresh.revoked);
        assert_eq!(access.revoked_at, refresh.revoked_at);
        assert_eq!(access.revoke_reason, refresh.revoke_reason);
        assert!(matches!(access.revoke_reason.as_deref(), Some("a") | Some("b")));
    }
}
