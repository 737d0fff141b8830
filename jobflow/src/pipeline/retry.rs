//! Retry policy and exponential backoff.
//!
//! The delay before attempt `k + 1` is `base * 2^k`. It is deterministic given
//! `k` and, unless a cap is configured, strictly increasing.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default base delay between attempts, in milliseconds.
pub const DEFAULT_BASE_DELAY_MS: u64 = 500;

/// Default number of retries after the first attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 2;

/// Exponential backoff schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackoffPolicy {
    /// Base delay in milliseconds.
    pub base_delay_ms: u64,
    /// Optional cap in milliseconds. Without a cap the delay only saturates
    /// at `u64::MAX` milliseconds.
    pub max_delay_ms: Option<u64>,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            base_delay_ms: DEFAULT_BASE_DELAY_MS,
            max_delay_ms: None,
        }
    }
}

impl BackoffPolicy {
    /// Creates an uncapped policy with the given base.
    #[must_use]
    pub const fn new(base_delay_ms: u64) -> Self {
        Self {
            base_delay_ms,
            max_delay_ms: None,
        }
    }

    /// Sets the delay cap.
    #[must_use]
    pub const fn with_max_delay_ms(mut self, max_delay_ms: u64) -> Self {
        self.max_delay_ms = Some(max_delay_ms);
        self
    }

    /// Returns the delay to wait after failed attempt `attempt` (0-based).
    #[must_use]
    pub fn delay(&self, attempt: u32) -> Duration {
        let exp_delay = self
            .base_delay_ms
            .saturating_mul(2u64.saturating_pow(attempt));
        let capped = self
            .max_delay_ms
            .map_or(exp_delay, |max| exp_delay.min(max));
        Duration::from_millis(capped)
    }
}

/// How failed attempts feed the failure counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureAccounting {
    /// Every failed attempt counts, even on a node that later succeeds.
    #[default]
    PerAttempt,
    /// Only a node that ends `Exhausted` (or `Rejected`) counts, once.
    PerNode,
}

/// Retry budget, backoff schedule and failure accounting for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Retries after the first attempt; a node gets `max_retries + 1` attempts.
    pub max_retries: u32,
    /// Delay schedule between attempts.
    pub backoff: BackoffPolicy,
    /// Failure counter semantics.
    pub failure_accounting: FailureAccounting,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            backoff: BackoffPolicy::default(),
            failure_accounting: FailureAccounting::default(),
        }
    }
}

impl RetryPolicy {
    /// Creates a retry policy with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the retry budget.
    #[must_use]
    pub const fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Sets the backoff schedule.
    #[must_use]
    pub const fn with_backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.backoff = backoff;
        self
    }

    /// Sets the failure accounting mode.
    #[must_use]
    pub const fn with_failure_accounting(mut self, accounting: FailureAccounting) -> Self {
        self.failure_accounting = accounting;
        self
    }

    /// Total attempts a node may make.
    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_policy_default() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries, 2);
        assert_eq!(policy.max_attempts(), 3);
        assert_eq!(policy.backoff.base_delay_ms, 500);
        assert_eq!(policy.failure_accounting, FailureAccounting::PerAttempt);
    }

    #[test]
    fn test_retry_policy_builder() {
        let policy = RetryPolicy::new()
            .with_max_retries(0)
            .with_backoff(BackoffPolicy::new(10).with_max_delay_ms(40))
            .with_failure_accounting(FailureAccounting::PerNode);

        assert_eq!(policy.max_attempts(), 1);
        assert_eq!(policy.backoff.max_delay_ms, Some(40));
        assert_eq!(policy.failure_accounting, FailureAccounting::PerNode);
    }

    #[test]
    fn test_delay_exponential() {
        let backoff = BackoffPolicy::new(500);
        assert_eq!(backoff.delay(0), Duration::from_millis(500));
        assert_eq!(backoff.delay(1), Duration::from_millis(1000));
        assert_eq!(backoff.delay(2), Duration::from_millis(2000));
        assert_eq!(backoff.delay(3), Duration::from_millis(4000));
    }

    #[test]
    fn test_delay_strictly_increasing_and_deterministic() {
        let backoff = BackoffPolicy::new(100);
        let delays: Vec<Duration> = (0..20).map(|k| backoff.delay(k)).collect();
        assert!(delays.windows(2).all(|w| w[0] < w[1]));

        let again: Vec<Duration> = (0..20).map(|k| backoff.delay(k)).collect();
        assert_eq!(delays, again);
    }

    #[test]
    fn test_delay_capped_at_max() {
        let backoff = BackoffPolicy::new(1000).with_max_delay_ms(5000);
        assert_eq!(backoff.delay(2), Duration::from_millis(4000));
        assert_eq!(backoff.delay(10), Duration::from_millis(5000));
    }

    #[test]
    fn test_delay_saturates() {
        let backoff = BackoffPolicy::new(500);
        assert_eq!(backoff.delay(200), Duration::from_millis(u64::MAX));
    }

    #[test]
    fn test_failure_accounting_serialize() {
        let json = serde_json::to_string(&FailureAccounting::PerNode).unwrap();
        assert_eq!(json, r#""per_node""#);
        let parsed: FailureAccounting = serde_json::from_str(r#""per_attempt""#).unwrap();
        assert_eq!(parsed, FailureAccounting::PerAttempt);
    }
}
