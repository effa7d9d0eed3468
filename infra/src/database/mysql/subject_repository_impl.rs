//! MySQL implementation of the SubjectRepository trait.
//!
//! Accounts are owned by the user service; this adapter only reads the id
//! and active flag from its table.

use async_trait::async_trait;
use sqlx::{MySqlPool, Row};

use fb_core::domain::entities::{Subject, SubjectId};
use fb_core::errors::DomainError;
use fb_core::repositories::SubjectRepository;

use crate::database::errors::storage_error;

/// Default table holding user accounts
pub const DEFAULT_SUBJECT_TABLE: &str = "users";

/// MySQL implementation of SubjectRepository
pub struct MySqlSubjectRepository {
    pool: MySqlPool,
    query: String,
}

impl MySqlSubjectRepository {
    /// Create a repository reading from the `users` table
    pub fn new(pool: MySqlPool) -> Self {
        Self {
            pool,
            query: lookup_query(DEFAULT_SUBJECT_TABLE),
        }
    }

    /// Create a repository reading from another table
    ///
    /// The table needs an `id` column and an `is_active` boolean column.
    pub fn with_table(pool: MySqlPool, table: &str) -> Result<Self, DomainError> {
        if table.is_empty() || !table.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(DomainError::Validation {
                message: format!("Invalid subject table name: {}", table),
            });
        }

        Ok(Self {
            pool,
            query: lookup_query(table),
        })
    }
}

fn lookup_query(table: &str) -> String {
    format!("SELECT is_active FROM `{}` WHERE id = ?", table)
}

#[async_trait]
impl SubjectRepository for MySqlSubjectRepository {
    async fn find_subject(&self, id: &SubjectId) -> Result<Option<Subject>, DomainError> {
        let row = sqlx::query(&self.query)
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| storage_error("find subject", e))?;

        let row = match row {
            Some(row) => row,
            None => return Ok(None),
        };

        let is_active: bool = row.try_get("is_active").map_err(|e| DomainError::Internal {
            message: format!("Failed to get is_active: {}", e),
        })?;

        Ok(Some(Subject {
            id: id.clone(),
            is_active,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_table_name_is_validated() {
        let pool = sqlx::mysql::MySqlPoolOptions::new()
            .connect_lazy("mysql://localhost/fastbin")
            .unwrap();

        assert!(MySqlSubjectRepository::with_table(pool.clone(), "accounts").is_ok());
        assert!(MySqlSubjectRepository::with_table(pool.clone(), "users; DROP TABLE x").is_err());
        assert!(MySqlSubjectRepository::with_table(pool, "").is_err());
    }

    #[test]
    fn test_lookup_query() {
        assert_eq!(lookup_query("users"), "SELECT is_active FROM `users` WHERE id = ?");
    }
}
