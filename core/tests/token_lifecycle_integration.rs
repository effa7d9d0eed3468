//! Integration tests for the token lifecycle through the public API

use std::sync::Arc;

use chrono::{Duration, Utc};

use fb_core::domain::entities::{Subject, SubjectId, TokenKind, TokenMetadata};
use fb_core::errors::{DomainError, TokenError};
use fb_core::repositories::{InMemorySubjectRepository, InMemoryTokenStore, TokenStore};
use fb_core::services::token::{
    ExpiryReaper, ExpiryReaperConfig, TokenService, TokenServiceConfig,
};
use fb_shared::config::JwtConfig;

fn service(
    store: Arc<InMemoryTokenStore>,
) -> TokenService<InMemoryTokenStore, InMemorySubjectRepository> {
    let jwt = JwtConfig::new("integration-secret-with-32-bytes-or-more");
    let config = TokenServiceConfig::from_jwt_config(&jwt).expect("valid jwt config");
    let subjects = Arc::new(InMemorySubjectRepository::with_subjects([Subject::active(42)]));
    TokenService::new(store, subjects, config).expect("keys load")
}

#[tokio::test]
async fn test_full_lifecycle_for_subject_42() {
    let store = Arc::new(InMemoryTokenStore::new());
    let service = service(Arc::clone(&store));

    // Issue
    let pair = service
        .issue_pair(Some(SubjectId::from(42)), TokenMetadata::new())
        .await
        .expect("issue pair");
    assert_eq!(store.len().await, 2);

    // Validate both halves
    let claims = service
        .validate(&pair.access_token, TokenKind::Access)
        .await
        .expect("access token valid");
    assert_eq!(claims.sub, Some(SubjectId::from(42)));
    service
        .validate(&pair.refresh_token, TokenKind::Refresh)
        .await
        .expect("refresh token valid");

    // Revoke the refresh token; the access token goes with it
    assert_eq!(service.revoke(pair.refresh_id, "logout").await.unwrap(), 2);
    assert_eq!(
        service.validate(&pair.access_token, TokenKind::Access).await,
        Err(DomainError::Token(TokenError::Revoked))
    );

    // Revoking again changes nothing
    assert_eq!(service.revoke(pair.access_id, "logout").await.unwrap(), 0);
}

#[tokio::test]
async fn test_reaper_removes_pairs_after_retention() {
    let store = Arc::new(InMemoryTokenStore::new());
    let service = service(Arc::clone(&store));

    let pair = service
        .issue_pair_with_ttl(
            Some(SubjectId::from(42)),
            TokenMetadata::new(),
            Duration::seconds(60),
            Duration::seconds(120),
        )
        .await
        .unwrap();
    let refresh = store.find_by_id(pair.refresh_id).await.unwrap().unwrap();

    let reaper = ExpiryReaper::new(
        Arc::clone(&store),
        ExpiryReaperConfig {
            retention: Duration::hours(1),
            ..ExpiryReaperConfig::default()
        },
    );

    // Inside the retention window the records stay
    let result = reaper.run_once_at(refresh.expires_at + Duration::minutes(30)).await;
    assert_eq!(result.deleted, 0);

    let result = reaper
        .run_once_at(refresh.expires_at + Duration::hours(1) + Duration::seconds(1))
        .await;
    assert!(result.is_success());
    assert_eq!(result.deleted, 2);
    assert!(store.is_empty().await);

    // Once reaped, the still-signed envelope no longer resolves
    assert_eq!(
        service.validate(&pair.access_token, TokenKind::Access).await,
        Err(DomainError::Token(TokenError::UnknownToken))
    );
}

#[tokio::test]
async fn test_records_created_now_are_not_reaped() {
    let store = Arc::new(InMemoryTokenStore::new());
    let service = service(Arc::clone(&store));
    service.issue_pair(None, TokenMetadata::new()).await.unwrap();

    let reaper = ExpiryReaper::new(Arc::clone(&store), ExpiryReaperConfig::default());
    let result = reaper.run_once_at(Utc::now()).await;

    assert_eq!(result.deleted, 0);
    assert_eq!(store.len().await, 2);
}
