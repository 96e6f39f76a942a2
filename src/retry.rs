//! Linear-backoff retry policy for store round-trips.

use crate::context::OpContext;
use crate::error::{Error, Result};
use std::future::Future;
use std::time::Duration;

/// Default step between attempts.
pub const DEFAULT_BACKOFF_STEP: Duration = Duration::from_millis(100);

/// How many extra attempts a store call gets and how long to wait between them.
///
/// The delay after failed attempt `n` (0-based) is `(n + 1) * step`, so
/// waits grow linearly: 100ms, 200ms, 300ms with the default step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub retries: u32,
    pub step: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            retries: 0,
            step: DEFAULT_BACKOFF_STEP,
        }
    }
}

/// What a retried operation ended with.
#[derive(Debug)]
pub(crate) enum Outcome<T> {
    Done(T),
    /// Every attempt failed; carries the attempt count and last error.
    Exhausted { attempts: u32, last: Error },
    /// A non-retryable error stopped the loop early.
    Fatal { attempts: u32, error: Error },
    Cancelled(crate::context::ContextError),
}

impl RetryPolicy {
    pub fn new(retries: u32) -> Self {
        RetryPolicy {
            retries,
            ..Default::default()
        }
    }

    pub fn with_step(mut self, step: Duration) -> Self {
        self.step = step;
        self
    }

    /// Total attempts including the first one.
    pub fn max_attempts(&self) -> u32 {
        self.retries.saturating_add(1)
    }

    /// Wait before the attempt following failed attempt `attempt` (0-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.step.saturating_mul(attempt.saturating_add(1))
    }

    /// Run `op` until it succeeds, fails fatally, runs out of attempts, or
    /// `ctx` is done.
    ///
    /// The context is checked before every attempt, raced against every
    /// attempt and raced against every backoff sleep. No sleep follows the
    /// last attempt.
    pub(crate) async fn run<T, F, Fut>(
        &self,
        ctx: &OpContext,
        key: &str,
        mut on_retry: impl FnMut(u32, &Error),
        mut op: F,
    ) -> Outcome<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let max_attempts = self.max_attempts();
        let mut attempt = 0;

        loop {
            let result = match ctx.run(op(attempt)).await {
                Ok(result) => result,
                Err(reason) => return Outcome::Cancelled(reason),
            };

            let err = match result {
                Ok(value) => return Outcome::Done(value),
                Err(e) if !e.is_retryable() => {
                    return Outcome::Fatal {
                        attempts: attempt + 1,
                        error: e,
                    }
                }
                Err(e) => e,
            };

            if attempt + 1 >= max_attempts {
                return Outcome::Exhausted {
                    attempts: attempt + 1,
                    last: err,
                };
            }

            let delay = self.delay_for(attempt);
            debug!(
                "Store call for {} failed (attempt {}/{}): {}; retrying in {:?}",
                key,
                attempt + 1,
                max_attempts,
                err,
                delay
            );
            on_retry(attempt + 1, &err);

            if let Err(reason) = ctx.sleep(delay).await {
                return Outcome::Cancelled(reason);
            }
            attempt += 1;
        }
    }
}
