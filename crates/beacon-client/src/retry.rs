//! Retry policy for collector deliveries.
//!
//! Pure functions over the attempt number and the configured
//! `(max_retries, backoff_base)` pair. Backoff is deterministic — no jitter
//! is added, because the system tolerates duplicate and late delivery.

use std::time::Duration;

/// Retry policy for a delivery chain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Retries allowed after the initial attempt; a persistently failing
    /// transport sees exactly `max_retries + 1` attempts.
    pub max_retries: u32,
    /// Exponential backoff base: attempt `k` sleeps `base^k` seconds.
    pub backoff_base: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_retries: crate::DEFAULT_MAX_RETRIES, backoff_base: crate::DEFAULT_BACKOFF_BASE }
    }
}

impl RetryPolicy {
    /// Whether a failure on `attempt` (0-based) should be retried.
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_retries
    }

    /// Sleep before the retry that follows a failure on `attempt`:
    /// `backoff_base ^ attempt` seconds. With the default base 2.0, attempts
    /// 0, 1, 2 sleep 1, 2 and 4 seconds.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        Duration::from_secs_f64(self.backoff_base.powi(exponent).max(0.0))
    }
}

/// Whether a delivery attempt should be made at all, given the shared
/// health flag. Only the first attempt is gated; a retry chain already in
/// flight proceeds regardless, so a surviving call can restore the flag.
pub fn should_attempt(attempt: u32, healthy: bool) -> bool {
    healthy || attempt > 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_is_exponential_in_the_attempt() {
        let policy = RetryPolicy { max_retries: 3, backoff_base: 2.0 };

        assert_eq!(policy.backoff_delay(0), Duration::from_secs(1));
        assert_eq!(policy.backoff_delay(1), Duration::from_secs(2));
        assert_eq!(policy.backoff_delay(2), Duration::from_secs(4));
    }

    #[test]
    fn fractional_base_supported() {
        let policy = RetryPolicy { max_retries: 3, backoff_base: 1.5 };

        assert_eq!(policy.backoff_delay(0), Duration::from_secs(1));
        assert_eq!(policy.backoff_delay(2), Duration::from_secs_f64(2.25));
    }

    #[test]
    fn retries_stop_at_max() {
        let policy = RetryPolicy { max_retries: 3, backoff_base: 2.0 };

        assert!(policy.should_retry(0));
        assert!(policy.should_retry(2));
        assert!(!policy.should_retry(3));
        assert!(!policy.should_retry(10));
    }

    #[test]
    fn zero_retries_means_single_attempt() {
        let policy = RetryPolicy { max_retries: 0, backoff_base: 2.0 };
        assert!(!policy.should_retry(0));
    }

    #[test]
    fn health_gate_only_blocks_first_attempts() {
        assert!(should_attempt(0, true));
        assert!(!should_attempt(0, false));
        assert!(should_attempt(1, false));
        assert!(should_attempt(5, false));
    }
}
