//! Retry strategies for webhook delivery.

use std::time::Duration;

/// Trait for retry strategies.
pub trait RetryStrategy: Send + Sync {
    /// Returns the delay before retry number `retry` (0-based), or None
    /// once retries are exhausted.
    fn next_delay(&self, retry: u32) -> Option<Duration>;

    /// Returns the maximum number of retries after the first attempt.
    fn retry_limit(&self) -> u32;

    /// Returns the upper bound for any single wait.
    fn delay_cap(&self) -> Duration;
}

/// Exponential backoff retry strategy.
///
/// Delay doubles on every retry: base * 2^retry, capped at `max_delay`.
#[derive(Debug, Clone)]
pub struct ExponentialBackoff {
    /// Base delay.
    pub base: Duration,
    /// Maximum delay cap.
    pub max_delay: Duration,
    /// Maximum number of retries.
    pub max_retries: u32,
}

impl ExponentialBackoff {
    /// Creates a new exponential backoff strategy.
    pub fn new() -> Self {
        Self {
            base: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            max_retries: 4,
        }
    }

    /// Sets the base delay.
    pub fn base(mut self, base: Duration) -> Self {
        self.base = base;
        self
    }

    /// Sets the maximum delay.
    pub fn max_delay(mut self, max: Duration) -> Self {
        self.max_delay = max;
        self
    }

    /// Sets the maximum retries.
    pub fn max_retries(mut self, max: u32) -> Self {
        self.max_retries = max;
        self
    }
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        Self::new()
    }
}

impl RetryStrategy for ExponentialBackoff {
    fn next_delay(&self, retry: u32) -> Option<Duration> {
        if retry >= self.max_retries {
            return None;
        }

        let multiplier = 2_u32.checked_pow(retry).unwrap_or(u32::MAX);
        let delay = self.base.saturating_mul(multiplier);
        Some(std::cmp::min(delay, self.max_delay))
    }

    fn retry_limit(&self) -> u32 {
        self.max_retries
    }

    fn delay_cap(&self) -> Duration {
        self.max_delay
    }
}
