//! Bounded exponential-backoff retry for transient failures.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use crate::config::RetryConfig;
use crate::error::{PipelineError, PipelineResult};

/// Retry policy applied inside a circuit breaker.
///
/// Only [`PipelineError::is_transient`] errors are retried. Permanent and degraded errors
/// return immediately. Once attempts are exhausted the last error propagates unchanged.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    config: RetryConfig,
}

impl RetryPolicy {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    /// A policy that makes exactly one attempt.
    pub fn none() -> Self {
        Self::new(RetryConfig {
            max_attempts: 1,
            ..RetryConfig::default()
        })
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Wait before attempt `attempt + 1`, where `attempt` counts completed attempts (≥ 1).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(32) as i32;
        let raw = self.config.min_wait.as_secs_f64() * self.config.multiplier.powi(exponent);
        let clamped = raw.clamp(
            self.config.min_wait.as_secs_f64(),
            self.config.max_wait.as_secs_f64(),
        );
        Duration::from_secs_f64(clamped)
    }

    fn should_retry(err: &PipelineError) -> bool {
        err.is_transient() && !err.is_circuit_open()
    }

    /// Runs `call` until it succeeds, fails non-transiently, or attempts run out.
    pub async fn run<F, Fut, T>(&self, operation: &str, mut call: F) -> PipelineResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = PipelineResult<T>>,
    {
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match call().await {
                Ok(value) => {
                    if attempt > 1 {
                        debug!(operation = operation, attempt, "Succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(err) if Self::should_retry(&err) && attempt < max_attempts => {
                    let wait = self.backoff(attempt);
                    debug!(
                        operation = operation,
                        attempt,
                        max_attempts,
                        wait_ms = wait.as_millis() as u64,
                        error = %err,
                        "Transient failure, retrying"
                    );
                    tokio::time::sleep(wait).await;
                    attempt += 1;
                }
                Err(err) => {
                    if Self::should_retry(&err) {
                        warn!(
                            operation = operation,
                            attempts = attempt,
                            error = %err,
                            "Retries exhausted"
                        );
                    }
                    return Err(err);
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(RetryConfig::default())
    }
}
