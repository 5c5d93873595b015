//! Retry with Exponential Backoff
//!
//! Re-runs an async operation on matching failures, sleeping between
//! attempts. Sleeps are tokio timers, so a waiting retry only suspends its
//! own task.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Retry schedule: attempt budget and delay growth
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    /// Delay before the first retry (milliseconds)
    pub initial_delay_ms: u64,
    /// Factor applied to the delay after every retry
    pub backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_ms: 2_000,
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, initial_delay: Duration, backoff_multiplier: f64) -> Self {
        Self {
            max_attempts,
            initial_delay_ms: initial_delay.as_millis() as u64,
            backoff_multiplier,
        }
    }

    /// Single attempt, no retries
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Default::default()
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay_ms = delay.as_millis() as u64;
        self
    }

    pub fn with_backoff(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }

    /// Delay slept after the given failed attempt (1-based).
    ///
    /// The multiplier is applied as given, so a factor below 1.0 shrinks the
    /// delay. Negative or NaN products saturate to zero.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1) as i32;
        let factor = self.backoff_multiplier.powi(exponent);
        Duration::from_millis((self.initial_delay_ms as f64 * factor).round() as u64)
    }
}

/// Run `operation` until it succeeds, fails with a non-matching error, or
/// the attempt budget is spent. Each retry is logged at warn level.
pub async fn with_retry<T, E, F, Fut, M>(
    policy: &RetryPolicy,
    matches: M,
    operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    M: Fn(&E) -> bool,
    E: Display,
{
    with_retry_notify(policy, matches, operation, |error: &E, attempt, delay| {
        tracing::warn!(
            "Attempt {} failed: {}. Retrying in {:?}",
            attempt,
            error,
            delay
        );
    })
    .await
}

/// Like [`with_retry`], calling `notify(error, attempt, delay)` before every sleep
pub async fn with_retry_notify<T, E, F, Fut, M, N>(
    policy: &RetryPolicy,
    matches: M,
    mut operation: F,
    mut notify: N,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    M: Fn(&E) -> bool,
    N: FnMut(&E, u32, Duration),
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < max_attempts && matches(&e) => {
                let delay = policy.delay_for(attempt);
                notify(&e, attempt, delay);
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
