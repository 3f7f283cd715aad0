// Retry logic for artifact creation
use crate::port::ArtifactError;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::controller::constants::{
    DEFAULT_BACKOFF_FACTOR, DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_BASE_DELAY_MS,
};

/// Retry decision result
#[derive(Debug, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry the item (with backoff delay in ms)
    Retry(i64),
    /// Do not retry, the item has failed permanently
    Failed,
}

/// Retry policy for a single work item
///
/// Determines if a failed creation should be retried based on:
/// - Attempts made so far
/// - Maximum attempts allowed
/// - Whether the error is retryable at all
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay_ms: i64,
    pub backoff_factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay_ms: DEFAULT_RETRY_BASE_DELAY_MS,
            backoff_factor: DEFAULT_BACKOFF_FACTOR,
        }
    }
}

impl RetryPolicy {
    /// Create a new retry policy
    ///
    /// # Arguments
    /// * `max_attempts` - Total attempts per item, first one included
    /// * `base_delay_ms` - Base delay in milliseconds
    /// * `backoff_factor` - Multiplier per attempt
    pub fn new(max_attempts: u32, base_delay_ms: i64, backoff_factor: f64) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay_ms: base_delay_ms.max(0),
            backoff_factor,
        }
    }

    /// Single attempt, no retries
    pub fn no_retry() -> Self {
        Self::new(1, 0, 1.0)
    }

    /// Decide what to do after `attempts` failed attempts of `item_id`
    ///
    /// Backoff formula:
    /// delay = base_delay * (backoff_factor ^ (attempts - 1)) * (1.0 ± 0.1)
    ///
    /// # Example
    /// ```text
    /// match policy.should_retry("item-3", 1, &err) {
    ///     RetryDecision::Retry(delay_ms) => sleep(delay_ms),
    ///     RetryDecision::Failed => record_failure(),
    /// }
    /// ```
    pub fn should_retry(&self, item_id: &str, attempts: u32, error: &ArtifactError) -> RetryDecision {
        if !error.is_retryable() {
            warn!(item_id = %item_id, error = %error, "Non-retryable creation error");
            return RetryDecision::Failed;
        }

        if attempts >= self.max_attempts {
            warn!(
                item_id = %item_id,
                attempts = attempts,
                max_attempts = self.max_attempts,
                "Max creation attempts reached"
            );
            return RetryDecision::Failed;
        }

        let exponent = attempts.saturating_sub(1) as i32;
        let base_delay_ms = self.base_delay_ms as f64 * self.backoff_factor.powi(exponent);

        // ±10% jitter seeded by the item id, so the same item always backs off
        // the same way
        let jitter_seed = item_id.chars().map(|c| c as u32).sum::<u32>();
        let jitter_factor = 0.9 + ((jitter_seed % 21) as f64 / 100.0); // 0.9 to 1.1

        let delay_ms = (base_delay_ms * jitter_factor) as i64;

        info!(
            item_id = %item_id,
            attempt = attempts,
            max_attempts = self.max_attempts,
            delay_ms = delay_ms,
            "Scheduling creation retry"
        );

        RetryDecision::Retry(delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outage() -> ArtifactError {
        ArtifactError::Unavailable("503".to_string())
    }

    #[test]
    fn test_retry_until_max_attempts() {
        let policy = RetryPolicy::new(3, 1000, 2.0);

        assert!(matches!(
            policy.should_retry("item-1", 1, &outage()),
            RetryDecision::Retry(_)
        ));
        assert!(matches!(
            policy.should_retry("item-1", 2, &outage()),
            RetryDecision::Retry(_)
        ));
        assert_eq!(
            policy.should_retry("item-1", 3, &outage()),
            RetryDecision::Failed
        );
    }

    #[test]
    fn test_backoff_grows_within_jitter_bounds() {
        let policy = RetryPolicy::new(5, 1000, 2.0);

        let RetryDecision::Retry(first) = policy.should_retry("item-7", 1, &outage()) else {
            panic!("expected retry");
        };
        let RetryDecision::Retry(second) = policy.should_retry("item-7", 2, &outage()) else {
            panic!("expected retry");
        };

        assert!((900..=1100).contains(&first), "first delay {}", first);
        assert!((1800..=2200).contains(&second), "second delay {}", second);
        assert!(second > first);
    }

    #[test]
    fn test_rejected_is_never_retried() {
        let policy = RetryPolicy::default();
        let rejected = ArtifactError::Rejected("bad domain".to_string());

        assert_eq!(
            policy.should_retry("item-1", 1, &rejected),
            RetryDecision::Failed
        );
    }

    #[test]
    fn test_no_retry_policy() {
        assert_eq!(
            RetryPolicy::no_retry().should_retry("item-1", 1, &outage()),
            RetryDecision::Failed
        );
    }
}
