//! Retry policy for remote calls
//!
//! Every call into the provider goes through [`RetryPolicy::run`]. Only errors
//! classified as transient by [`crate::CloudError::is_retryable`] are retried; anything
//! else is returned on the first attempt.

use crate::error::Result;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

/// Retry configuration for provider operations
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first one
    pub max_attempts: u32,

    /// Delay before the first retry
    pub initial_delay: Duration,

    /// Upper bound for a single delay
    pub max_delay: Duration,

    /// Backoff multiplier
    pub backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 60,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(5),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Delay to wait after the `attempt`-th failure (0-based)
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = self.backoff_multiplier.powi(attempt.min(i32::MAX as u32) as i32);
        let delay = self.initial_delay.as_secs_f64() * factor;
        if !delay.is_finite() || delay >= self.max_delay.as_secs_f64() {
            self.max_delay
        } else {
            Duration::from_secs_f64(delay)
        }
    }

    /// Invoke `call` until it succeeds, fails terminally, or the attempt budget
    /// is spent. The last error is returned unchanged.
    pub async fn run<T, F, Fut>(&self, mut call: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            let err = match call().await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };
            attempt += 1;

            if !err.is_retryable() {
                return Err(err);
            }
            if attempt >= max_attempts {
                tracing::debug!("giving up after {} attempts: {}", attempt, err);
                return Err(err);
            }

            let delay = self.delay_for_attempt(attempt - 1);
            tracing::debug!(
                "retryable error (attempt {}/{}), sleeping {:?}: {}",
                attempt,
                max_attempts,
                delay,
                err
            );
            sleep(delay).await;
        }
    }
}

/// Run `call` with the default policy
pub async fn retry<T, F, Fut>(call: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    RetryPolicy::default().run(call).await
}
