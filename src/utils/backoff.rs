//! Exponential Backoff Helper
//!
//! Sleep-based backoff used between catalog pages and download retries.
//! Delays double per attempt and are capped at a bounded ceiling.

use std::time::Duration;

/// Exponential backoff with a bounded ceiling
#[derive(Debug, Clone)]
pub struct Backoff {
    /// Base delay applied on the first retry
    base: Duration,
    /// Upper bound no delay will exceed
    cap: Duration,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            base: Duration::from_millis(500),
            cap: Duration::from_secs(10),
        }
    }
}

impl Backoff {
    /// Create a backoff from millisecond values
    pub fn new(base_ms: u64, cap_ms: u64) -> Self {
        Self {
            base: Duration::from_millis(base_ms),
            cap: Duration::from_millis(cap_ms.max(base_ms)),
        }
    }

    /// Base delay (used for steady pacing between catalog pages)
    pub fn base(&self) -> Duration {
        self.base
    }

    /// Delay for the given zero-based retry attempt: `base * 2^attempt`,
    /// capped at the ceiling.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        let delay = self.base.checked_mul(factor).unwrap_or(self.cap);
        delay.min(self.cap)
    }

    /// Block the calling thread for the attempt's delay
    pub fn sleep(&self, attempt: u32) {
        let delay = self.delay_for(attempt);
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
    }
}
