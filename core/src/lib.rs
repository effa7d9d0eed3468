//! # Fastbin Core
//!
//! Token lifecycle and revocation for the Fastbin backend.
//! This crate contains the token domain entities, the persistence traits the
//! subsystem consumes, and the services that issue, validate, revoke and reap
//! paired access/refresh credentials.

pub mod domain;
pub mod errors;
pub mod repositories;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::*;
pub use errors::*;
pub use repositories::*;
pub use services::*;
