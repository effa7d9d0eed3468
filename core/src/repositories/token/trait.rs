//! Token store trait defining the interface for token record persistence.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::entities::{Revocation, SubjectId, TokenRecord};
use crate::errors::DomainError;

/// Persistence abstraction over token records
///
/// The store owns no business logic: pairing, cascading and retention are
/// decided by the services and passed down as plain arguments. What the
/// store does guarantee is atomicity of the multi-record writes below.
///
/// # Concurrency
/// - `create_pair` makes both records visible together or not at all
/// - `mark_revoked` flips every listed record in one write; a record that is
///   already revoked keeps its original `revoked_at`/`revoke_reason`
///
/// Storage outages are reported as `TokenError::StorageFailure`, flagged
/// retryable when another attempt may succeed.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Persist both records of a freshly issued pair atomically
    ///
    /// # Arguments
    /// * `access` - The access record, paired with `refresh`
    /// * `refresh` - The refresh record, paired with `access`
    ///
    /// # Returns
    /// * `Ok(())` - Both records are visible
    /// * `Err(DomainError)` - Neither record is visible
    ///
    /// # Example
    /// ```no_run
    /// # use chrono::{Duration, Utc};
    /// # use fb_core::domain::entities::{TokenMetadata, TokenRecord};
    /// # use fb_core::repositories::TokenStore;
    /// # async fn example(store: &impl TokenStore) -> Result<(), Box<dyn std::error::Error>> {
    /// let (access, refresh) = TokenRecord::new_pair(
    ///     None,
    ///     TokenMetadata::new(),
    ///     Utc::now(),
    ///     Duration::minutes(30),
    ///     Duration::days(7),
    /// )?;
    /// store.create_pair(&access, &refresh).await?;
    /// # Ok(())
    /// # }
    /// ```
    async fn create_pair(&self, access: &TokenRecord, refresh: &TokenRecord) -> Result<(), DomainError>;

    /// Find a token record by its jti
    ///
    /// # Returns
    /// * `Ok(Some(TokenRecord))` - Record found
    /// * `Ok(None)` - No record with that id
    /// * `Err(DomainError)` - Storage error occurred
    async fn find_by_id(&self, id: Uuid) -> Result<Option<TokenRecord>, DomainError>;

    /// Revoke every listed record that is not revoked yet, in one atomic write
    ///
    /// Ids that do not exist or are already revoked are skipped.
    ///
    /// # Returns
    /// * `Ok(usize)` - Number of records that transitioned to revoked
    /// * `Err(DomainError)` - Nothing was written
    async fn mark_revoked(&self, ids: &[Uuid], revocation: &Revocation) -> Result<usize, DomainError>;

    /// Find every non-revoked record for a subject, both kinds
    async fn find_unrevoked_by_subject(&self, subject_id: &SubjectId) -> Result<Vec<TokenRecord>, DomainError>;

    /// Delete about `limit` records that expired before `cutoff`
    ///
    /// A record qualifies only when its pair is gone or also expired before
    /// `cutoff`. Both records of a pair are deleted in the same batch, so a
    /// batch may hold one record more than `limit`.
    ///
    /// # Returns
    /// * `Ok(usize)` - Number of records deleted
    /// * `Err(DomainError)` - Deletion failed
    async fn delete_expired(&self, cutoff: DateTime<Utc>, limit: usize) -> Result<usize, DomainError>;

    /// Load a record together with its sibling
    ///
    /// # Returns
    /// * `Ok(None)` - No record with that id
    /// * `Ok(Some((record, None)))` - The sibling is already gone
    async fn find_pair(&self, id: Uuid) -> Result<Option<(TokenRecord, Option<TokenRecord>)>, DomainError> {
        let record = match self.find_by_id(id).await? {
            Some(record) => record,
            None => return Ok(None),
        };
        let paired = self.find_by_id(record.paired_id).await?;
        Ok(Some((record, paired)))
    }

    /// Count non-revoked records for a subject
    async fn count_unrevoked_for_subject(&self, subject_id: &SubjectId) -> Result<usize, DomainError> {
        let records = self.find_unrevoked_by_subject(subject_id).await?;
        Ok(records.len())
    }
}
