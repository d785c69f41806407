//! Retry combinator with pluggable backoff and sleeping.
//!
//! Remote calls are retried locally before a failure is surfaced. The
//! [`Sleeper`] seam lets tests observe backoff without waiting for it.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use crate::error::DomainError;

/// Suspends the current task.
#[async_trait]
pub trait Sleeper: Send + Sync {
    /// Sleeps for `duration`.
    async fn sleep(&self, duration: Duration);
}

/// Production sleeper backed by the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Delay schedule between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// `step × attempt` after each failed attempt.
    Linear {
        /// Delay after the first failure.
        step: Duration,
    },
    /// The same delay after every failure.
    Fixed(Duration),
}

impl Backoff {
    /// Delay to wait after `failed_attempt` (1-based) failed.
    #[must_use]
    pub fn delay_after(&self, failed_attempt: u32) -> Duration {
        match *self {
            Self::Linear { step } => step.saturating_mul(failed_attempt),
            Self::Fixed(delay) => delay,
        }
    }
}

/// How many times to try and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Delay schedule.
    pub backoff: Backoff,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Backoff::Linear {
                step: Duration::from_secs(1),
            },
        }
    }
}

/// Errors that know whether another attempt is worthwhile.
pub trait Retryable {
    /// `false` short-circuits the retry loop.
    fn is_transient(&self) -> bool;
}

impl Retryable for DomainError {
    fn is_transient(&self) -> bool {
        DomainError::is_transient(self)
    }
}

/// Runs `operation` until it succeeds, fails non-transiently, or the attempt
/// budget is spent. The last error is returned.
///
/// # Errors
///
/// Returns the error of the final attempt.
pub async fn retry<T, E, F, Fut>(
    policy: &RetryPolicy,
    sleeper: &dyn Sleeper,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Retryable + Display,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if attempt < max_attempts && err.is_transient() => {
                let delay = policy.backoff.delay_after(attempt);
                warn!(attempt, max_attempts, ?delay, error = %err, "attempt failed, retrying");
                sleeper.sleep(delay).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}
