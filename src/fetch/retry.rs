//! Bounded retry state machine with exponential backoff.

use std::future::Future;
use std::time::Duration;

use rand::Rng;

use super::sleeper::Sleeper;
use crate::config::{BACKOFF_JITTER_SECS, MAX_BACKOFF};
use crate::error_handling::FetchError;

/// How many attempts a request gets and how long to wait between them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub max_backoff: Duration,
    /// Upper bound (seconds) of the uniform jitter added to each delay.
    pub jitter_secs: f64,
}

impl RetryPolicy {
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            max_backoff: MAX_BACKOFF,
            jitter_secs: BACKOFF_JITTER_SECS,
        }
    }

    /// Delay after failed attempt `attempt` (zero-based): `2^attempt + jitter`
    /// seconds, capped at `max_backoff`.
    pub fn backoff(&self, attempt: u32, jitter: f64) -> Duration {
        let base = 2f64.powi(attempt.min(31) as i32);
        let secs = (base + jitter.max(0.0)).min(self.max_backoff.as_secs_f64());
        Duration::from_secs_f64(secs)
    }

    /// Draws a jitter value in `[0, jitter_secs)`.
    pub fn draw_jitter(&self) -> f64 {
        if self.jitter_secs > 0.0 {
            rand::rng().random_range(0.0..self.jitter_secs)
        } else {
            0.0
        }
    }

    /// State following a failed `attempt`.
    pub fn after_failure<T>(&self, attempt: u32, error: &FetchError, jitter: f64) -> RetryState<T> {
        if !error.is_retryable() || attempt + 1 >= self.max_retries {
            RetryState::Exhausted
        } else {
            RetryState::Backoff {
                attempt,
                delay: self.backoff(attempt, jitter),
            }
        }
    }
}

/// Where a retried request stands.
#[derive(Debug, Clone, PartialEq)]
pub enum RetryState<T> {
    /// About to issue attempt `n` (zero-based).
    Attempt(u32),
    /// Attempt `attempt` failed; wait `delay` before the next one.
    Backoff { attempt: u32, delay: Duration },
    Success(T),
    /// No attempts left, or the failure cannot be retried.
    Exhausted,
}

/// Drives `operation` through the retry states until it succeeds or the
/// policy gives up. `on_failure` sees every failed attempt before the policy
/// decides what happens next.
pub async fn run_with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    sleeper: &dyn Sleeper,
    mut operation: F,
    mut on_failure: impl FnMut(u32, &FetchError),
) -> Option<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
{
    if policy.max_retries == 0 {
        return None;
    }
    let mut state = RetryState::Attempt(0);
    loop {
        state = match state {
            RetryState::Attempt(n) => match operation(n).await {
                Ok(value) => RetryState::Success(value),
                Err(e) => {
                    on_failure(n, &e);
                    policy.after_failure(n, &e, policy.draw_jitter())
                }
            },
            RetryState::Backoff { attempt, delay } => {
                sleeper.sleep(delay).await;
                RetryState::Attempt(attempt + 1)
            }
            RetryState::Success(value) => return Some(value),
            RetryState::Exhausted => return None,
        };
    }
}
