//! Expiry reaper scheduling configuration

use serde::{Deserialize, Serialize};

use super::env_or;

/// Longest retention window accepted (ten years)
pub const MAX_RETENTION_SECONDS: i64 = 10 * 365 * 24 * 3600;

/// Configuration for the background sweep of expired token records
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReaperConfig {
    /// How often to run a sweep (in seconds)
    pub interval_seconds: u64,

    /// How long an expired record is kept before deletion (in seconds)
    pub retention_seconds: i64,

    /// Maximum number of records deleted per batch
    pub batch_size: usize,

    /// Whether the sweep runs at all
    pub enabled: bool,
}

impl Default for ReaperConfig {
    fn default() -> Self {
        Self {
            interval_seconds: 3600,    // every hour
            retention_seconds: 604800, // keep expired records for 7 days
            batch_size: 1000,
            enabled: true,
        }
    }
}

impl ReaperConfig {
    /// Load reaper settings from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            interval_seconds: env_or("REAPER_INTERVAL_SECONDS", defaults.interval_seconds),
            retention_seconds: env_or("REAPER_RETENTION_SECONDS", defaults.retention_seconds),
            batch_size: env_or("REAPER_BATCH_SIZE", defaults.batch_size),
            enabled: env_or("REAPER_ENABLED", defaults.enabled),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.interval_seconds == 0 {
            return Err("reaper interval must be at least one second".to_string());
        }
        if self.retention_seconds < 0 {
            return Err("reaper retention cannot be negative".to_string());
        }
        if self.retention_seconds > MAX_RETENTION_SECONDS {
            return Err(format!(
                "reaper retention cannot exceed {} seconds",
                MAX_RETENTION_SECONDS
            ));
        }
        if self.batch_size == 0 {
            return Err("reaper batch size must be positive".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ReaperConfig::default();
        assert_eq!(config.interval_seconds, 3600);
        assert_eq!(config.retention_seconds, 7 * 24 * 3600);
        assert!(config.enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_values() {
        let config = ReaperConfig {
            batch_size: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = ReaperConfig {
            interval_seconds: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = ReaperConfig {
            retention_seconds: i64::MAX,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
