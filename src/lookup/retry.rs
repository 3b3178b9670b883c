//! Backoff policy for failed navigations

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::LookupError;
use crate::utils::{DEFAULT_MAX_RETRIES, DEFAULT_RETRY_BASE_DELAY, DEFAULT_RETRY_JITTER};

/// Exponential backoff with jitter: `base * 2^attempt + rand(0..jitter)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Retries after the first attempt; 0 disables retrying
    pub max_retries: u32,
    pub base_delay: Duration,
    pub jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: DEFAULT_RETRY_BASE_DELAY,
            jitter: DEFAULT_RETRY_JITTER,
        }
    }
}

impl RetryPolicy {
    #[must_use]
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Whether `error` after `attempt` failed attempts (0-based) warrants another try
    #[must_use]
    pub fn should_retry(&self, error: &LookupError, attempt: u32) -> bool {
        attempt < self.max_retries && is_retryable_error(error)
    }

    /// Delay before retry number `attempt` (0-based)
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        let base = self.base_delay.saturating_mul(factor);
        let jitter_ms = u64::try_from(self.jitter.as_millis()).unwrap_or(u64::MAX);
        if jitter_ms == 0 {
            return base;
        }
        base + Duration::from_millis(rand::rng().random_range(0..jitter_ms))
    }
}

/// Classify a failed navigation
///
/// Only timeouts and navigation faults are candidates. Browser death and
/// CAPTCHA pages fail fast; unknown navigation causes retry conservatively.
#[must_use]
pub fn is_retryable_error(error: &LookupError) -> bool {
    let cause = match error {
        LookupError::Timeout { .. } => return true,
        LookupError::NavigationFailed { cause } => cause.to_lowercase(),
        _ => return false,
    };

    // Permanent errors - browser/page state is broken, retry won't help
    if cause.contains("browser closed")
        || cause.contains("browser disconnected")
        || cause.contains("page closed")
        || cause.contains("target closed")
        || cause.contains("session closed")
        || cause.contains("no response from the chromium instance")
        || cause.contains("captcha")
        || cause.contains("websocket")
    {
        return false;
    }

    true
}
