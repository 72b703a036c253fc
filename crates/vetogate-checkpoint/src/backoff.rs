//! Retry/backoff policy for relay writes.
//!
//! Kept as an explicit value rather than sleeps scattered through the send
//! path, so the budget is visible in config and in tests.

use tokio::time::Duration;

/// Bounded attempt count with a fixed delay between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total write attempts, including the first.
    pub max_attempts: u32,
    /// Pause between attempts.
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self { max_attempts, delay }
    }

    /// True if another attempt is allowed after `attempts` have failed.
    pub fn may_retry(&self, attempts: u32) -> bool {
        attempts < self.max_attempts
    }

    /// Sleep out the inter-attempt delay.
    pub async fn pause(&self) {
        tokio::time::sleep(self.delay).await;
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(1),
        }
    }
}
