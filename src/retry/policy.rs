//! Retry policy and backoff delay computation.

use std::time::Duration;

/// Default number of retries after the initial attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default delay before the first retry.
pub const DEFAULT_INITIAL_DELAY: Duration = Duration::from_millis(1000);

/// Cap on the backoff exponent so the doubling multiplier cannot overflow.
const MAX_BACKOFF_EXPONENT: u32 = 20;

/// Bounded exponential backoff policy.
///
/// One policy is instantiated per coordinator and reused across all load
/// calls issued through it. The backoff multiplier is fixed at 2x per
/// attempt; delays are computed in integer milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Number of retries after the initial attempt. Zero means exactly one
    /// attempt and no retry.
    pub max_retries: u32,
    /// Delay before the first retry. Zero performs immediate retries.
    pub initial_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            initial_delay: DEFAULT_INITIAL_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Creates a new retry policy.
    pub fn new(max_retries: u32, initial_delay: Duration) -> Self {
        Self {
            max_retries,
            initial_delay,
        }
    }

    /// Returns the delay preceding the given retry attempt.
    ///
    /// Attempt numbers start at 1 for the first retry; the delay doubles for
    /// each subsequent attempt: `initial_delay * 2^(attempt-1)`. The exponent
    /// is clamped and the multiplication saturates, so the result can never
    /// overflow or go negative regardless of attempt count.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        let exponent = (attempt - 1).min(MAX_BACKOFF_EXPONENT);
        let millis = (self.initial_delay.as_millis() as u64).saturating_mul(1u64 << exponent);
        Duration::from_millis(millis)
    }
}
