//! Database module - MySQL implementations using SQLx
//!
//! This module provides database access layer implementations including:
//! - Connection pool management and embedded migrations
//! - Token store and subject lookup implementations
//! - Mapping of driver errors to retryable/permanent storage failures

pub mod connection;
pub mod errors;
pub mod mysql;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use connection::{DatabasePool, PoolStatistics};
pub use errors::{is_sqlx_retryable, storage_error};
pub use mysql::{MySqlSubjectRepository, MySqlTokenStore};
