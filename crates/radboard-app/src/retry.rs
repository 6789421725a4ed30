//! Bounded retry with configurable backoff.
//!
//! One combinator covers every retry loop in the provisioning sequence, so
//! attempt counting and delay math live in exactly one place. Errors steer
//! the loop through the [`Retryable`] trait: they can refuse further
//! attempts or dictate their own delay.

use std::future::Future;
use std::time::Duration;

use tracing::debug;

/// Backoff shape between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// Same delay before every retry
    Fixed,
    /// Delay grows by the base each retry (base, 2*base, 3*base, ...)
    Linear,
}

/// Configuration for one retry loop.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    /// Base delay between attempts.
    pub base_delay: Duration,
    pub backoff: Backoff,
    /// Delay cap.
    pub max_delay: Duration,
    /// Operation name for logging.
    pub operation: String,
}

impl RetryConfig {
    /// Create a retry config with the given operation name.
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            backoff: Backoff::Linear,
            max_delay: Duration::from_secs(10),
            operation: operation.into(),
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Delay after the `attempt`-th failure (1-based).
    fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let delay = match self.backoff {
            Backoff::Fixed => self.base_delay,
            Backoff::Linear => self.base_delay.saturating_mul(attempt),
        };
        delay.min(self.max_delay)
    }
}

/// Error classification for retry loops.
pub trait Retryable {
    /// Whether another attempt can change the outcome.
    fn is_retryable(&self) -> bool {
        true
    }

    /// Error-specific delay after the `attempt`-th failure, overriding the
    /// configured backoff.
    fn delay_override(&self, attempt: u32) -> Option<Duration> {
        let _ = attempt;
        None
    }
}

/// Result of a retry loop.
#[derive(Debug)]
pub enum RetryResult<T, E> {
    /// Operation succeeded.
    Success(T),
    /// Operation failed; either retries ran out or the error refused them.
    Failed { error: E, attempts: u32 },
}

impl<T, E> RetryResult<T, E> {
    /// Returns true if the operation succeeded.
    pub fn is_success(&self) -> bool {
        matches!(self, RetryResult::Success(_))
    }

    /// Unwrap the success value or panic.
    pub fn unwrap(self) -> T
    where
        E: std::fmt::Debug,
    {
        match self {
            RetryResult::Success(v) => v,
            RetryResult::Failed { error, attempts } => {
                panic!("Operation failed after {} attempts: {:?}", attempts, error)
            }
        }
    }
}

/// Execute an async operation with bounded retries.
///
/// The operation runs up to `config.max_attempts` times. Failures sleep
/// between attempts per the configured backoff unless the error overrides
/// the delay; a non-retryable error ends the loop at once.
pub async fn retry_async<F, Fut, T, E>(config: &RetryConfig, operation: F) -> RetryResult<T, E>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Retryable + std::fmt::Display,
{
    let mut attempt = 1u32;

    loop {
        match operation().await {
            Ok(value) => return RetryResult::Success(value),
            Err(e) if e.is_retryable() && attempt < config.max_attempts => {
                let delay = e
                    .delay_override(attempt)
                    .unwrap_or_else(|| config.delay_for_attempt(attempt))
                    .min(config.max_delay);
                debug!(
                    "{} attempt {} failed, retrying in {:?}: {}",
                    config.operation, attempt, delay, e
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => {
                return RetryResult::Failed { error: e, attempts: attempt };
            }
        }
    }
}
