//! Expiry reaper for periodic removal of stale token records
//!
//! Records stay in storage for a retention window after they expire so
//! that a recently expired token still resolves to its record. Once
//! `now > expires_at + retention` holds for both records of a pair, the
//! pair is deleted. Failures are logged and reported in the sweep result;
//! the next sweep picks up whatever was missed.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use fb_shared::config::ReaperConfig;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::errors::DomainError;
use crate::repositories::TokenStore;

/// Configuration for the expiry reaper
#[derive(Debug, Clone)]
pub struct ExpiryReaperConfig {
    /// Time between sweeps
    pub interval: std::time::Duration,
    /// Grace period after expiry before deletion
    pub retention: Duration,
    /// Maximum number of records to delete in one batch
    pub batch_size: usize,
    /// Whether sweeps run at all
    pub enabled: bool,
}

impl Default for ExpiryReaperConfig {
    fn default() -> Self {
        Self {
            interval: std::time::Duration::from_secs(3600), // Run every hour
            retention: Duration::days(7),                    // Keep expired records for 7 days
            batch_size: 1000,
            enabled: true,
        }
    }
}

impl TryFrom<&ReaperConfig> for ExpiryReaperConfig {
    type Error = DomainError;

    fn try_from(config: &ReaperConfig) -> Result<Self, Self::Error> {
        let retention = Duration::try_seconds(config.retention_seconds)
            .filter(|retention| *retention >= Duration::zero())
            .ok_or_else(|| DomainError::Validation {
                message: format!("reaper retention of {}s is out of range", config.retention_seconds),
            })?;

        Ok(Self {
            interval: std::time::Duration::from_secs(config.interval_seconds),
            retention,
            batch_size: config.batch_size.max(1),
            enabled: config.enabled,
        })
    }
}

/// Deletes records whose retention window has elapsed
pub struct ExpiryReaper<S: TokenStore + 'static> {
    store: Arc<S>,
    config: ExpiryReaperConfig,
}

impl<S: TokenStore + 'static> ExpiryReaper<S> {
    pub fn new(store: Arc<S>, config: ExpiryReaperConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &ExpiryReaperConfig {
        &self.config
    }

    /// Run a single sweep against the current time
    pub async fn run_once(&self) -> ReapResult {
        self.run_once_at(Utc::now()).await
    }

    /// Run a single sweep as of `now`
    ///
    /// Deletes in batches of `batch_size` until a batch comes back short or
    /// the store fails. Never returns an error: failures end the sweep and
    /// are recorded in `ReapResult::errors`.
    pub async fn run_once_at(&self, now: DateTime<Utc>) -> ReapResult {
        let mut result = ReapResult::default();

        if !self.config.enabled {
            return result;
        }

        // A retention reaching past the calendar means nothing is old enough
        let cutoff = now
            .checked_sub_signed(self.config.retention)
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        let batch_size = self.config.batch_size.max(1);

        loop {
            match self.store.delete_expired(cutoff, batch_size).await {
                Ok(deleted) => {
                    result.deleted += deleted;
                    result.batches += 1;
                    if deleted < batch_size {
                        break;
                    }
                }
                Err(e) => {
                    error!("Failed to delete expired token records: {}", e);
                    result.errors.push(format!("Reap error: {}", e));
                    break;
                }
            }
        }

        info!(
            "Expiry sweep completed - Deleted: {}, Batches: {}, Errors: {}",
            result.deleted,
            result.batches,
            result.errors.len()
        );

        result
    }

    /// Start sweeping as a background task
    ///
    /// The first sweep runs immediately, then one every `interval`.
    ///
    /// # Returns
    ///
    /// `None` when the reaper is disabled, otherwise the task handle
    pub fn spawn(self: Arc<Self>) -> Option<JoinHandle<()>> {
        if !self.config.enabled {
            warn!("Expiry reaper is disabled");
            return None;
        }

        Some(tokio::spawn(async move {
            info!(
                "Expiry reaper started - will run every {} seconds",
                self.config.interval.as_secs()
            );

            let mut interval_timer = tokio::time::interval(self.config.interval);

            loop {
                interval_timer.tick().await;

                let result = self.run_once().await;
                if !result.is_success() {
                    warn!("Expiry sweep completed with errors: {:?}", result.errors);
                }
            }
        }))
    }
}

/// Result of a single sweep
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReapResult {
    /// Number of records deleted
    pub deleted: usize,
    /// Number of delete batches issued, including the final short one
    pub batches: usize,
    /// Any errors encountered during the sweep
    pub errors: Vec<String>,
}

impl ReapResult {
    /// Check if the sweep finished without errors
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }
}
