//! Mapping of SQLx errors onto storage failures
//!
//! Connection-level problems and MySQL lock conflicts are retryable; query,
//! decode and constraint errors are not.

use fb_core::errors::DomainError;
use sqlx::mysql::MySqlDatabaseError;

/// MySQL server error numbers worth another attempt
///
/// - 1040: too many connections
/// - 1205: lock wait timeout exceeded
/// - 1213: deadlock found when trying to get lock
const RETRYABLE_MYSQL_ERRORS: &[u16] = &[1040, 1205, 1213];

/// Whether `error` may go away on a later attempt
pub fn is_sqlx_retryable(error: &sqlx::Error) -> bool {
    match error {
        sqlx::Error::Io(_) => true,
        sqlx::Error::Tls(_) => true,
        sqlx::Error::PoolTimedOut => true,
        sqlx::Error::WorkerCrashed => true,
        sqlx::Error::PoolClosed => false,
        sqlx::Error::Database(db_err) => db_err
            .try_downcast_ref::<MySqlDatabaseError>()
            .map(|mysql_err| RETRYABLE_MYSQL_ERRORS.contains(&mysql_err.number()))
            .unwrap_or(false),
        _ => false,
    }
}

/// Wraps a driver error as a storage failure for `operation`
pub fn storage_error(operation: &str, error: sqlx::Error) -> DomainError {
    let message = format!("Failed to {}: {}", operation, error);
    if is_sqlx_retryable(&error) {
        DomainError::transient(message)
    } else {
        DomainError::storage(message)
    }
}
