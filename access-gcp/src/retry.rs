//! Retry with exponential backoff.
//!
//! Only transient failures are retried (see [`GcpError::is_transient`]);
//! anything else returns on the first attempt.
//!
//! [`GcpError::is_transient`]: crate::error::GcpError::is_transient

use std::time::Duration;
use tokio::time::sleep;

/// Retry policy for one request.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Maximum attempts, including the first.
    pub max_attempts: u32,

    /// Delay before the second attempt.
    pub initial_delay: Duration,

    /// Upper bound for any delay.
    pub max_delay: Duration,

    /// Growth factor applied after each failed attempt.
    pub exponential_base: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(10),
            exponential_base: 2.0,
        }
    }
}

impl RetryConfig {
    /// Policy used for API reads.
    pub fn standard() -> Self {
        Self::default()
    }

    /// A single attempt.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            exponential_base: 1.0,
        }
    }

    /// Override the attempt count. Zero is treated as one.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Override the initial delay.
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Delay that follows `delay`.
    fn next_delay(&self, delay: Duration) -> Duration {
        Duration::from_secs_f64(
            (delay.as_secs_f64() * self.exponential_base).min(self.max_delay.as_secs_f64()),
        )
    }
}

/// Run `f` until it succeeds, fails with an error `is_retryable` rejects, or
/// runs out of attempts.
///
/// # Arguments
///
/// * `config` - Retry policy
/// * `f` - Operation producing a fresh future per attempt
/// * `is_retryable` - Whether an error is worth another attempt
///
/// # Example
///
/// ```rust,no_run
/// use access_gcp::retry::{with_retry_if, RetryConfig};
///
/// async fn example() -> Result<u32, u16> {
///     with_retry_if(&RetryConfig::standard(), || async { Err(503) }, |status| *status >= 500).await
/// }
/// ```
pub async fn with_retry_if<F, Fut, T, E, P>(
    config: &RetryConfig,
    mut f: F,
    mut is_retryable: P,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    E: std::fmt::Debug,
    P: FnMut(&E) -> bool,
{
    let mut attempt = 0;
    let mut delay = config.initial_delay;

    loop {
        attempt += 1;

        match f().await {
            Ok(result) => {
                if attempt > 1 {
                    tracing::info!(attempts = attempt, "Request succeeded after retry");
                }
                return Ok(result);
            }
            Err(e) if !is_retryable(&e) => return Err(e),
            Err(e) if attempt >= config.max_attempts => {
                tracing::warn!(attempts = attempt, error = ?e, "Giving up after retries");
                return Err(e);
            }
            Err(e) => {
                tracing::debug!(
                    attempt = attempt,
                    max_attempts = config.max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = ?e,
                    "Transient failure, retrying"
                );
                sleep(delay).await;
                delay = config.next_delay(delay);
            }
        }
    }
}
