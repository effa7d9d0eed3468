//! MySQL implementation of the TokenStore trait.
//!
//! Records live in the `token_records` table. Pair creation runs in a
//! transaction and pair revocation is a single conditional UPDATE, so both
//! multi-record writes are atomic.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{MySqlPool, Row};
use uuid::Uuid;

use fb_core::domain::entities::{Revocation, SubjectId, TokenKind, TokenMetadata, TokenRecord};
use fb_core::errors::DomainError;
use fb_core::repositories::TokenStore;

use crate::database::errors::storage_error;

const RECORD_COLUMNS: &str = "id, kind, paired_id, subject_id, issued_at, expires_at, \
     revoked, revoked_at, revoke_reason, metadata";

/// MySQL implementation of TokenStore
pub struct MySqlTokenStore {
    /// Database connection pool
    pool: MySqlPool,
}

impl MySqlTokenStore {
    /// Create a new MySQL token store
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Convert database row to TokenRecord entity
    fn row_to_record(row: &sqlx::mysql::MySqlRow) -> Result<TokenRecord, DomainError> {
        let id: String = row.try_get("id").map_err(|e| decode_error("id", e))?;
        let kind: String = row.try_get("kind").map_err(|e| decode_error("kind", e))?;
        let paired_id: String = row.try_get("paired_id").map_err(|e| decode_error("paired_id", e))?;
        let subject_id: Option<String> = row
            .try_get("subject_id")
            .map_err(|e| decode_error("subject_id", e))?;
        let metadata: Option<Json<TokenMetadata>> = row
            .try_get("metadata")
            .map_err(|e| decode_error("metadata", e))?;

        Ok(TokenRecord {
            id: parse_uuid(&id)?,
            kind: kind.parse::<TokenKind>().map_err(|message| DomainError::Internal { message })?,
            paired_id: parse_uuid(&paired_id)?,
            subject_id: subject_id.map(SubjectId::from),
            issued_at: row
                .try_get::<DateTime<Utc>, _>("issued_at")
                .map_err(|e| decode_error("issued_at", e))?,
            expires_at: row
                .try_get::<DateTime<Utc>, _>("expires_at")
                .map_err(|e| decode_error("expires_at", e))?,
            revoked: row.try_get("revoked").map_err(|e| decode_error("revoked", e))?,
            revoked_at: row
                .try_get::<Option<DateTime<Utc>>, _>("revoked_at")
                .map_err(|e| decode_error("revoked_at", e))?,
            revoke_reason: row
                .try_get("revoke_reason")
                .map_err(|e| decode_error("revoke_reason", e))?,
            metadata: metadata.map(|Json(metadata)| metadata).unwrap_or_default(),
        })
    }
}

fn decode_error(column: &str, error: sqlx::Error) -> DomainError {
    DomainError::Internal {
        message: format!("Failed to get {}: {}", column, error),
    }
}

fn parse_uuid(value: &str) -> Result<Uuid, DomainError> {
    Uuid::parse_str(value).map_err(|e| DomainError::Internal {
        message: format!("Invalid token UUID: {}", e),
    })
}

/// `?, ?, ...` for an IN list of `count` values
fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

/// Ids to delete for the selected rows, siblings included
///
/// Stops once `limit` is reached, but never between the two records of a
/// pair, so a batch can end one record past `limit`.
fn pair_batch(rows: Vec<(String, Option<String>)>, limit: usize) -> Vec<String> {
    let mut ids: Vec<String> = Vec::with_capacity(limit + 1);
    for (id, sibling) in rows {
        if ids.len() >= limit {
            break;
        }
        if ids.contains(&id) {
            continue;
        }
        ids.push(id);
        if let Some(sibling) = sibling {
            ids.push(sibling);
        }
    }
    ids
}

#[async_trait]
impl TokenStore for MySqlTokenStore {
    async fn create_pair(&self, access: &TokenRecord, refresh: &TokenRecord) -> Result<(), DomainError> {
        if !access.is_paired_with(refresh) {
            return Err(DomainError::Validation {
                message: "records do not form a pair".to_string(),
            });
        }

        let query = format!(
            "INSERT INTO token_records ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            RECORD_COLUMNS
        );

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| storage_error("begin token pair transaction", e))?;

        for record in [access, refresh] {
            sqlx::query(&query)
                .bind(record.id.to_string())
                .bind(record.kind.as_str())
                .bind(record.paired_id.to_string())
                .bind(record.subject_id.as_ref().map(|s| s.as_str().to_string()))
                .bind(record.issued_at)
                .bind(record.expires_at)
                .bind(record.revoked)
                .bind(record.revoked_at)
                .bind(record.revoke_reason.as_deref())
                .bind(Json(&record.metadata))
                .execute(&mut *tx)
                .await
                .map_err(|e| storage_error("save token record", e))?;
        }

        tx.commit()
            .await
            .map_err(|e| storage_error("commit token pair", e))?;

        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<TokenRecord>, DomainError> {
        let query = format!("SELECT {} FROM token_records WHERE id = ?", RECORD_COLUMNS);

        let row = sqlx::query(&query)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| storage_error("find token record", e))?;

        row.as_ref().map(Self::row_to_record).transpose()
    }

    async fn mark_revoked(&self, ids: &[Uuid], revocation: &Revocation) -> Result<usize, DomainError> {
        let mut ids: Vec<String> = ids.iter().map(Uuid::to_string).collect();
        ids.sort();
        ids.dedup();
        if ids.is_empty() {
            return Ok(0);
        }

        let query = format!(
            r#"
            UPDATE token_records
            SET revoked = TRUE, revoked_at = ?, revoke_reason = ?
            WHERE revoked = FALSE AND id IN ({})
            "#,
            placeholders(ids.len())
        );

        let mut statement = sqlx::query(&query)
            .bind(revocation.revoked_at)
            .bind(revocation.reason.as_str());
        for id in &ids {
            statement = statement.bind(id.as_str());
        }

        let result = statement
            .execute(&self.pool)
            .await
            .map_err(|e| storage_error("revoke token records", e))?;

        Ok(result.rows_affected() as usize)
    }

    async fn find_unrevoked_by_subject(&self, subject_id: &SubjectId) -> Result<Vec<TokenRecord>, DomainError> {
        let query = format!(
            "SELECT {} FROM token_records WHERE subject_id = ? AND revoked = FALSE",
            RECORD_COLUMNS
        );

        let rows = sqlx::query(&query)
            .bind(subject_id.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| storage_error("find subject token records", e))?;

        rows.iter().map(Self::row_to_record).collect()
    }

    async fn delete_expired(&self, cutoff: DateTime<Utc>, limit: usize) -> Result<usize, DomainError> {
        if limit == 0 {
            return Ok(0);
        }

        // MySQL rejects LIMIT on multi-table DELETE, so select the batch first
        let select = r#"
            SELECT t.id, p.id
            FROM token_records t
            LEFT JOIN token_records p ON p.id = t.paired_id
            WHERE t.expires_at < ? AND (p.id IS NULL OR p.expires_at < ?)
            ORDER BY t.expires_at, t.id
            LIMIT ?
        "#;

        let rows: Vec<(String, Option<String>)> = sqlx::query_as(select)
            .bind(cutoff)
            .bind(cutoff)
            .bind(limit as u64)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| storage_error("select expired token records", e))?;

        let ids = pair_batch(rows, limit);
        if ids.is_empty() {
            return Ok(0);
        }

        let delete = format!(
            "DELETE FROM token_records WHERE expires_at < ? AND id IN ({})",
            placeholders(ids.len())
        );

        let mut statement = sqlx::query(&delete).bind(cutoff);
        for id in &ids {
            statement = statement.bind(id.as_str());
        }

        let result = statement
            .execute(&self.pool)
            .await
            .map_err(|e| storage_error("delete expired token records", e))?;

        Ok(result.rows_affected() as usize)
    }
}
