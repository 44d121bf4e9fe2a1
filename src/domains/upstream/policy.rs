//! Retry policy for upstream calls.

use std::time::Duration;

use super::error::UpstreamError;

/// Factor applied to the delay after every retry.
pub const BACKOFF_MULTIPLIER: u32 = 2;

/// Bounded exponential-backoff retry policy.
///
/// Built once at startup and shared read-only by every invocation.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    max_retries: u32,
    initial_delay: Duration,
    retryable_status: fn(u16) -> bool,
}

/// Rate limiting and server-side failures are worth another attempt;
/// every other status is the caller's problem.
pub fn default_retryable_status(status: u16) -> bool {
    status == 429 || status >= 500
}

impl RetryPolicy {
    /// Create a policy making at most `max_retries` retries after the first attempt.
    pub fn new(max_retries: u32, initial_delay: Duration) -> Self {
        Self {
            max_retries,
            initial_delay,
            retryable_status: default_retryable_status,
        }
    }

    /// A policy that never retries.
    pub fn no_retry() -> Self {
        Self::new(0, Duration::ZERO)
    }

    /// Replace the status classification predicate.
    pub fn with_retryable_status(mut self, predicate: fn(u16) -> bool) -> Self {
        self.retryable_status = predicate;
        self
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn initial_delay(&self) -> Duration {
        self.initial_delay
    }

    /// Total number of attempts, including the first one.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Delay to wait before retry `retry` (1 is the first retry).
    pub fn delay_before_retry(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1);
        let factor = BACKOFF_MULTIPLIER.checked_pow(exponent).unwrap_or(u32::MAX);
        self.initial_delay.saturating_mul(factor)
    }

    /// Whether a failed attempt may be retried.
    pub fn is_retryable(&self, error: &UpstreamError) -> bool {
        match error {
            UpstreamError::Network { .. } => true,
            UpstreamError::Status { status, .. } => (self.retryable_status)(*status),
            UpstreamError::InvalidRequest(_) | UpstreamError::MalformedResponse(_) => false,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(1000))
    }
}
