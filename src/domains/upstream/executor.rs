//! Retry-aware request executor.
//!
//! Wraps a single upstream call with bounded retry. Failures are classified by
//! the [`RetryPolicy`]: network failures, 429 and 5xx responses are retried
//! with exponential backoff, everything else fails on the spot. When the
//! attempt budget runs out the last observed failure is returned.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, instrument, warn};

use super::descriptor::UpstreamCallDescriptor;
use super::error::UpstreamError;
use super::policy::RetryPolicy;
use super::transport::Transport;

/// Executes upstream calls with retry.
///
/// Holds no mutable state, so one executor serves any number of concurrent
/// invocations.
#[derive(Clone)]
pub struct RequestExecutor {
    transport: Arc<dyn Transport>,
    policy: RetryPolicy,
}

impl RequestExecutor {
    pub fn new(transport: Arc<dyn Transport>, policy: RetryPolicy) -> Self {
        Self { transport, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Perform the described call, retrying transient failures.
    ///
    /// Returns the upstream JSON body of the first successful attempt.
    #[instrument(skip_all, fields(method = %descriptor.method, path = %descriptor.path))]
    pub async fn execute(
        &self,
        descriptor: &UpstreamCallDescriptor,
    ) -> Result<Value, UpstreamError> {
        let max_attempts = self.policy.max_attempts();
        let mut attempt = 1;

        loop {
            let error = match self.attempt(descriptor).await {
                Ok(body) => {
                    debug!("Upstream call succeeded on attempt {}", attempt);
                    return Ok(body);
                }
                Err(e) => e,
            };

            if !self.policy.is_retryable(&error) {
                debug!("Non-retryable upstream failure: {}", error);
                return Err(error);
            }

            if attempt >= max_attempts {
                warn!(
                    "Upstream call failed after {} attempt(s): {}",
                    attempt, error
                );
                return Err(error);
            }

            let delay = self.policy.delay_before_retry(attempt);
            warn!(
                "Attempt {}/{} failed ({}), retrying in {:?}",
                attempt, max_attempts, error, delay
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    async fn attempt(&self, descriptor: &UpstreamCallDescriptor) -> Result<Value, UpstreamError> {
        let response = self.transport.send(descriptor).await?;
        if response.is_success() {
            Ok(response.body)
        } else {
            Err(UpstreamError::status(response.status, response.body))
        }
    }
}
