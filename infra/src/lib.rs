//! # Infrastructure Layer
//!
//! Concrete implementations behind the token subsystem's traits:
//! - **Database**: MySQL token store and subject lookup using SQLx
//! - **Telemetry**: tracing subscriber setup driven by `LoggingConfig`
//!
//! `initialize` wires both together from the environment, which is what the
//! `token-reaper` binary and the request layer call at startup.

use std::sync::Arc;

use fb_core::services::token::{ExpiryReaper, ExpiryReaperConfig};
use fb_shared::config::AppConfig;

// Re-export core types for convenience
pub use fb_core::errors::*;

/// Database module - MySQL implementations using SQLx
pub mod database;

/// Tracing subscriber initialization
pub mod telemetry;

use database::{DatabasePool, MySqlSubjectRepository, MySqlTokenStore};

/// Infrastructure service container
#[derive(Clone)]
pub struct InfrastructureServices {
    /// Configuration the services were built from
    pub config: AppConfig,
    /// Shared connection pool
    pub pool: DatabasePool,
    /// Token record persistence
    pub token_store: Arc<MySqlTokenStore>,
    /// Account lookup for subject checks
    pub subjects: Arc<MySqlSubjectRepository>,
}

/// Initialize infrastructure services from the environment
///
/// This function sets up:
/// - `.env` loading and configuration validation
/// - The tracing subscriber
/// - The database connection pool and, if enabled, migrations
pub async fn initialize() -> Result<InfrastructureServices, InfrastructureError> {
    let config = load_config()?;
    telemetry::init_tracing(&config.logging)?;
    initialize_with(config).await
}

/// Initialize infrastructure services from an explicit configuration
///
/// Does not touch the global tracing subscriber.
pub async fn initialize_with(config: AppConfig) -> Result<InfrastructureServices, InfrastructureError> {
    tracing::info!("Initializing infrastructure services for {}", config.environment);

    let pool = DatabasePool::new(config.database.clone()).await?;
    if config.database.run_migrations {
        pool.run_migrations().await?;
    }

    let services = InfrastructureServices::with_pool(config, pool);

    tracing::info!("Infrastructure services initialized successfully");

    Ok(services)
}

impl InfrastructureServices {
    /// Builds the stores on top of an existing pool
    pub fn with_pool(config: AppConfig, pool: DatabasePool) -> Self {
        let token_store = Arc::new(MySqlTokenStore::new(pool.get_pool().clone()));
        let subjects = Arc::new(MySqlSubjectRepository::new(pool.get_pool().clone()));

        Self {
            config,
            pool,
            token_store,
            subjects,
        }
    }

    /// Expiry reaper over the MySQL store, configured from `config.reaper`
    pub fn expiry_reaper(&self) -> Result<ExpiryReaper<MySqlTokenStore>, InfrastructureError> {
        let config = ExpiryReaperConfig::try_from(&self.config.reaper)?;
        Ok(ExpiryReaper::new(Arc::clone(&self.token_store), config))
    }
}

/// Load and validate configuration from the environment
pub fn load_config() -> Result<AppConfig, InfrastructureError> {
    dotenvy::dotenv().ok(); // Load .env file if present

    let config = AppConfig::from_env();
    config.validate().map_err(InfrastructureError::Config)?;
    Ok(config)
}

/// Infrastructure-specific error types
#[derive(Debug, thiserror::Error)]
pub enum InfrastructureError {
    /// Database connection error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Schema migration error
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Tracing subscriber could not be installed
    #[error("Telemetry error: {0}")]
    Telemetry(String),

    /// Error raised by the token services
    #[error(transparent)]
    Domain(#[from] DomainError),
}
