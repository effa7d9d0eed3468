//! Revocation with pair cascade

use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use crate::domain::entities::{Revocation, SubjectId, TokenRecord, MAX_REVOKE_REASON_LENGTH};
use crate::errors::DomainError;
use crate::repositories::TokenStore;

use super::retry::{with_retry, RetryPolicy};

/// Reason recorded when a refresh rotates a pair
pub const REVOKE_REASON_ROTATED: &str = "rotated";

/// Reason recorded on logout
pub const REVOKE_REASON_LOGOUT: &str = "logout";

/// Revokes records, always together with their sibling
pub struct RevocationService<S: TokenStore> {
    store: Arc<S>,
    retry: RetryPolicy,
}

impl<S: TokenStore> RevocationService<S> {
    pub fn new(store: Arc<S>, retry: RetryPolicy) -> Self {
        Self { store, retry }
    }

    /// Revokes a token and its paired token
    ///
    /// Idempotent: an unknown id or an already revoked record is a no-op.
    ///
    /// # Returns
    ///
    /// * `Ok(usize)` - Number of records this call moved to revoked (0, 1 or 2)
    /// * `Err(DomainError)` - Reason too long or storage failure
    pub async fn revoke(&self, token_id: Uuid, reason: &str) -> Result<usize, DomainError> {
        validate_reason(reason)?;

        let record = with_retry(&self.retry, "find_by_id", || self.store.find_by_id(token_id)).await?;
        let record = match record {
            Some(record) => record,
            None => {
                debug!("Revocation of unknown token {} ignored", token_id);
                return Ok(0);
            }
        };

        let revocation = Revocation::now(reason);
        self.revoke_record(&record, &revocation).await
    }

    /// Revokes every non-revoked record of a subject
    ///
    /// # Returns
    ///
    /// * `Ok(usize)` - Number of records this call moved to revoked
    /// * `Err(DomainError)` - Reason too long or storage failure; records
    ///   revoked before the failure stay revoked
    pub async fn revoke_all_for_subject(
        &self,
        subject_id: &SubjectId,
        reason: &str,
    ) -> Result<usize, DomainError> {
        validate_reason(reason)?;

        let records = with_retry(&self.retry, "find_unrevoked_by_subject", || {
            self.store.find_unrevoked_by_subject(subject_id)
        })
        .await?;

        let revocation = Revocation::now(reason);
        let mut revoked = 0;
        for record in &records {
            // Siblings revoked earlier in this loop report zero transitions
            revoked += self.revoke_record(record, &revocation).await?;
        }

        info!(
            subject = %subject_id,
            revoked,
            reason,
            "Revoked all tokens for subject"
        );

        Ok(revoked)
    }

    async fn revoke_record(
        &self,
        record: &TokenRecord,
        revocation: &Revocation,
    ) -> Result<usize, DomainError> {
        if record.revoked {
            return Ok(0);
        }

        let ids = [record.id, record.paired_id];
        let revoked = with_retry(&self.retry, "mark_revoked", || {
            self.store.mark_revoked(&ids, revocation)
        })
        .await?;

        if revoked > 0 {
            info!(
                token_id = %record.id,
                paired_id = %record.paired_id,
                revoked,
                reason = %revocation.reason,
                "Revoked token pair"
            );
        }

        Ok(revoked)
    }
}

/// Rejects reasons that do not fit the stored column
pub fn validate_reason(reason: &str) -> Result<(), DomainError> {
    if reason.chars().count() > MAX_REVOKE_REASON_LENGTH {
        return Err(DomainError::Validation {
            message: format!(
                "revocation reason must be at most {} characters",
                MAX_REVOKE_REASON_LENGTH
            ),
        });
    }
    Ok(())
}
