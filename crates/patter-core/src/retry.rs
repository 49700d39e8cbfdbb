//! Bounded retry policy shared by the model caller and provider detectors.
//!
//! Attempt numbering is 1-based: the first execution is attempt 1, so a
//! policy with `max_attempts = 3` performs at most two retries.

use std::time::Duration;

/// Delay schedule applied between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// No delay between attempts.
    None,
    /// Constant delay between attempts.
    Fixed { delay_ms: u64 },
    /// Doubling delay: `base_ms * 2^(attempt - 1)` after attempt N fails.
    Exponential { base_ms: u64 },
}

/// Retry budget plus backoff schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Backoff,
}

impl RetryPolicy {
    /// Policy that never retries.
    pub fn never() -> Self {
        Self {
            max_attempts: 1,
            backoff: Backoff::None,
        }
    }

    /// Policy allowing `extra_attempts` retries after the first attempt,
    /// with exponential backoff starting at `base_ms`.
    pub fn exponential(extra_attempts: u32, base_ms: u64) -> Self {
        Self {
            max_attempts: extra_attempts.saturating_add(1),
            backoff: Backoff::Exponential { base_ms },
        }
    }

    /// Policy allowing `extra_attempts` retries with a fixed delay.
    pub fn fixed(extra_attempts: u32, delay_ms: u64) -> Self {
        Self {
            max_attempts: extra_attempts.saturating_add(1),
            backoff: Backoff::Fixed { delay_ms },
        }
    }

    /// Whether another attempt is allowed after `attempt` (1-based) failed.
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }

    /// Delay to sleep after `attempt` (1-based) failed, before the next one.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        match self.backoff {
            Backoff::None => Duration::ZERO,
            Backoff::Fixed { delay_ms } => Duration::from_millis(delay_ms),
            Backoff::Exponential { base_ms } => {
                // Cap the shift so a large attempt count cannot overflow.
                let exp = attempt.saturating_sub(1).min(16);
                Duration::from_millis(base_ms.saturating_mul(1u64 << exp))
            }
        }
    }
}
