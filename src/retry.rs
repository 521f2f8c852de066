//! Retry policy with exponential backoff.

use std::time::Duration;

/// Number of times a request is re-sent after the first attempt.
pub const MAX_RETRIES: u32 = 3;

/// Delay before the first retry; each later retry doubles it.
pub const BASE_DELAY: Duration = Duration::from_millis(1000);

/// Statuses that cause the identical request to be re-sent.
pub const RETRY_STATUS_CODES: [u16; 6] = [408, 429, 500, 502, 503, 504];

/// Returns true if a response with this status should be retried.
pub fn is_retryable_status(status_code: u16) -> bool {
    RETRY_STATUS_CODES.contains(&status_code)
}

/// How many times, and how far apart, a failed request is retried.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of retries after the first attempt.
    pub max_retries: u32,
    /// Delay before the first retry.
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// Creates a policy with the given retry budget and base delay.
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    /// A policy that never retries.
    pub fn disabled() -> Self {
        Self::new(0, Duration::ZERO)
    }

    /// The delay before retry number `attempt`, counted from 1:
    /// `base_delay * 2^(attempt - 1)`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        self.base_delay.saturating_mul(1u32 << exponent)
    }

    /// Returns true if another retry fits in the budget after `retries_done`.
    pub fn has_budget(&self, retries_done: u32) -> bool {
        retries_done < self.max_retries
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(MAX_RETRIES, BASE_DELAY)
    }
}
