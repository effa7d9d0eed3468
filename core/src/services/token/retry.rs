//! Bounded retry for token store calls
//!
//! Storage failures flagged retryable get a few attempts with exponential
//! backoff; every attempt runs under a timeout so a hung store surfaces as a
//! `StorageFailure` instead of blocking the caller.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tracing::{info, warn};

use crate::errors::DomainError;

/// Retry and timeout settings for store calls
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    /// Delay before the second attempt
    pub base_delay: Duration,
    /// Upper bound for any single delay
    pub max_delay: Duration,
    /// Deadline for each individual attempt
    pub attempt_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(25),
            max_delay: Duration::from_millis(250),
            attempt_timeout: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    /// Single attempt, no backoff
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Backoff before retrying after `attempt` (zero-based) failed
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponential = self
            .base_delay
            .saturating_mul(2u32.saturating_pow(attempt))
            .min(self.max_delay);

        // Up to 25% jitter keeps concurrent callers from retrying in lockstep
        let jitter_ceiling = exponential.as_millis() as u64 / 4;
        let jitter = if jitter_ceiling > 0 {
            rand::thread_rng().gen_range(0..=jitter_ceiling)
        } else {
            0
        };

        (exponential + Duration::from_millis(jitter)).min(self.max_delay)
    }
}

/// Runs `operation` until it succeeds, fails permanently or attempts run out
///
/// Only errors for which `DomainError::is_retryable` holds are retried. The
/// last error is returned unchanged, so a storage outage still fails closed.
pub async fn with_retry<F, Fut, T>(
    policy: &RetryPolicy,
    operation_name: &str,
    mut operation: F,
) -> Result<T, DomainError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, DomainError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        let outcome = match tokio::time::timeout(policy.attempt_timeout, operation()).await {
            Ok(outcome) => outcome,
            Err(_) => Err(DomainError::transient(format!(
                "{} timed out after {}ms",
                operation_name,
                policy.attempt_timeout.as_millis()
            ))),
        };

        match outcome {
            Ok(value) => {
                if attempt > 0 {
                    info!(
                        operation = operation_name,
                        attempt = attempt + 1,
                        "Token store operation succeeded after retry"
                    );
                }
                return Ok(value);
            }
            Err(e) if e.is_retryable() && attempt + 1 < max_attempts => {
                let delay = policy.delay_for_attempt(attempt);
                warn!(
                    operation = operation_name,
                    attempt = attempt + 1,
                    max_attempts,
                    error = %e,
                    delay_ms = delay.as_millis() as u64,
                    "Token store operation failed, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => {
                if e.is_storage_failure() {
                    warn!(
                        operation = operation_name,
                        attempt = attempt + 1,
                        error = %e,
                        "Token store operation failed, giving up"
                    );
                }
                return Err(e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
            attempt_timeout: Duration::from_millis(50),
        }
    }

    #[test]
    fn test_delay_is_capped() {
        let policy = RetryPolicy::default();
        for attempt in 0..10 {
            assert!(policy.delay_for_attempt(attempt) <= policy.max_delay);
        }
        assert!(policy.delay_for_attempt(0) >= policy.base_delay);
    }

    #[tokio::test]
    async fn test_retries_transient_failures_until_success() {
        let calls = AtomicU32::new(0);

        let result = with_retry(&fast_policy(), "test", || async {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(DomainError::transient("connection reset"))
            } else {
                Ok(7)
            }
        })
        .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let calls = AtomicU32::new(0);

        let result: Result<(), _> = with_retry(&fast_policy(), "test", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(DomainError::transient("connection reset"))
        })
        .await;

        assert!(result.unwrap_err().is_storage_failure());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_permanent_failures_are_not_retried() {
        let calls = AtomicU32::new(0);

        let result: Result<(), _> = with_retry(&fast_policy(), "test", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(DomainError::storage("constraint violation"))
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_hung_attempt_times_out_as_storage_failure() {
        let policy = RetryPolicy {
            max_attempts: 2,
            ..fast_policy()
        };
        let calls = AtomicU32::new(0);

        let result: Result<(), _> = with_retry(&policy, "slow", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;

        let err = result.unwrap_err();
        assert!(err.is_storage_failure());
        assert!(err.is_retryable());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
