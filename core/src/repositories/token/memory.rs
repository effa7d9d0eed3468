//! In-memory implementation of TokenStore
//!
//! Backs tests and single-process deployments. Every multi-record write
//! happens under one write lock, which gives the same atomicity the SQL
//! implementation gets from transactions.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::entities::{Revocation, SubjectId, TokenRecord};
use crate::errors::DomainError;

use super::r#trait::TokenStore;

/// Token store keeping records in a shared map
#[derive(Clone, Default)]
pub struct InMemoryTokenStore {
    records: Arc<RwLock<HashMap<Uuid, TokenRecord>>>,
}

impl InMemoryTokenStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a single record as-is, bypassing pair checks
    ///
    /// Used to seed fixtures such as already-expired records.
    pub async fn insert(&self, record: TokenRecord) {
        self.records.write().await.insert(record.id, record);
    }

    /// Remove a single record as-is
    pub async fn remove(&self, id: Uuid) -> Option<TokenRecord> {
        self.records.write().await.remove(&id)
    }

    /// Number of stored records
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl TokenStore for InMemoryTokenStore {
    async fn create_pair(&self, access: &TokenRecord, refresh: &TokenRecord) -> Result<(), DomainError> {
        if !access.is_paired_with(refresh) {
            return Err(DomainError::Validation {
                message: "records do not form a pair".to_string(),
            });
        }

        let mut records = self.records.write().await;

        if records.contains_key(&access.id) || records.contains_key(&refresh.id) {
            return Err(DomainError::storage("token id already exists"));
        }

        records.insert(access.id, access.clone());
        records.insert(refresh.id, refresh.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<TokenRecord>, DomainError> {
        let records = self.records.read().await;
        Ok(records.get(&id).cloned())
    }

    async fn mark_revoked(&self, ids: &[Uuid], revocation: &Revocation) -> Result<usize, DomainError> {
        let mut records = self.records.write().await;
        let mut count = 0;

        for id in ids {
            if let Some(record) = records.get_mut(id) {
                if record.apply_revocation(revocation) {
                    count += 1;
                }
            }
        }

        Ok(count)
    }

    async fn find_unrevoked_by_subject(&self, subject_id: &SubjectId) -> Result<Vec<TokenRecord>, DomainError> {
        let records = self.records.read().await;
        Ok(records
            .values()
            .filter(|r| !r.revoked && r.subject_id.as_ref() == Some(subject_id))
            .cloned()
            .collect())
    }

    async fn delete_expired(&self, cutoff: DateTime<Utc>, limit: usize) -> Result<usize, DomainError> {
        if limit == 0 {
            return Ok(0);
        }

        let mut records = self.records.write().await;

        let mut candidates: Vec<(DateTime<Utc>, Uuid, Option<Uuid>)> = records
            .values()
            .filter(|r| r.expires_at < cutoff)
            .filter_map(|r| match records.get(&r.paired_id) {
                Some(pair) if pair.expires_at < cutoff => Some((r.expires_at, r.id, Some(pair.id))),
                Some(_) => None,
                None => Some((r.expires_at, r.id, None)),
            })
            .collect();
        candidates.sort();

        // Siblings ride along, so a batch can end one record past `limit`
        let mut batch: Vec<Uuid> = Vec::with_capacity(limit + 1);
        for (_, id, sibling) in candidates {
            if batch.len() >= limit {
                break;
            }
            if batch.contains(&id) {
                continue;
            }
            batch.push(id);
            if let Some(sibling) = sibling {
                batch.push(sibling);
            }
        }

        let mut deleted = 0;
        for id in batch {
            if records.remove(&id).is_some() {
                deleted += 1;
            }
        }

        Ok(deleted)
    }
}
