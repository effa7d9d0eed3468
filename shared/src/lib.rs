//! Shared configuration types for the Fastbin server
//!
//! This crate carries the configuration surface consumed by the token
//! subsystem and its infrastructure:
//! - Environment detection and logging configuration
//! - Database connection settings
//! - JWT signing and token lifetimes
//! - Expiry reaper scheduling

pub mod config;

// Re-export commonly used items at crate root
pub use config::{
    AppConfig, AuthConfig, DatabaseConfig, Environment, JwtConfig, LogFormat, LoggingConfig,
    ReaperConfig,
};
