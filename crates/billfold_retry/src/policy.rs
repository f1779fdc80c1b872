//! Jittered exponential backoff around a fallible async operation.

use billfold_error::RetryableError;
use derive_getters::Getters;
use std::future::Future;
use std::time::Duration;
use tokio_retry2::strategy::{ExponentialBackoff, jitter};
use tokio_retry2::{Retry, RetryError};
use tracing::{debug, warn};

/// Total attempts made by the default policy.
pub const DEFAULT_MAX_ATTEMPTS: usize = 10;

const DEFAULT_INITIAL_BACKOFF: Duration = Duration::from_secs(1);
const DEFAULT_MAX_BACKOFF: Duration = Duration::from_secs(60);

/// Retry policy for idempotent remote calls.
///
/// - Waits are randomized: each delay is a jittered fraction of `d`, where
///   `d` starts at `initial_backoff`, doubles per attempt and is capped at
///   `max_backoff`.
/// - At most `max_attempts` invocations in total (at least one).
/// - Errors that are not retryable end the loop immediately.
/// - The last error is returned unchanged.
///
/// # Examples
///
/// ```
/// use billfold_retry::RetryPolicy;
/// use std::time::Duration;
///
/// let policy = RetryPolicy::builder()
///     .max_attempts(3)
///     .initial_backoff(Duration::from_millis(100))
///     .build();
///
/// assert_eq!(*policy.max_attempts(), 3);
/// assert_eq!(*RetryPolicy::default().max_attempts(), 10);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Getters)]
pub struct RetryPolicy {
    /// Total invocations allowed, first attempt included.
    max_attempts: usize,
    /// Upper bound of the first randomized wait.
    initial_backoff: Duration,
    /// Cap on any single wait.
    max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            initial_backoff: DEFAULT_INITIAL_BACKOFF,
            max_backoff: DEFAULT_MAX_BACKOFF,
        }
    }
}

impl RetryPolicy {
    /// Creates a new retry policy builder.
    pub fn builder() -> RetryPolicyBuilder {
        RetryPolicyBuilder::default()
    }

    /// The waits between attempts, one fewer than `max_attempts`.
    pub fn delays(&self) -> impl Iterator<Item = Duration> {
        // Base 2 scaled by half the initial delay yields
        // initial, 2 * initial, 4 * initial, ...
        let half_initial_ms = (self.initial_backoff.as_millis() as u64 / 2).max(1);
        ExponentialBackoff::from_millis(2)
            .factor(half_initial_ms)
            .max_delay(self.max_backoff)
            .map(jitter)
            .take(self.max_attempts.saturating_sub(1))
    }

    /// Runs `operation` until it succeeds, fails terminally, or the attempt
    /// bound is reached.
    ///
    /// `operation` is invoked once per attempt and must be safe to repeat.
    ///
    /// # Errors
    ///
    /// Returns the terminal error after one attempt, or the last transient
    /// error once all attempts are spent.
    pub async fn execute<F, Fut, T, E>(&self, operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: RetryableError + std::fmt::Display,
    {
        self.execute_when(operation, |e: &E| e.is_retryable()).await
    }

    /// Like [`execute`](Self::execute), but only errors accepted by
    /// `should_retry` are retried.
    ///
    /// # Errors
    ///
    /// Returns the first error `should_retry` rejects, or the last error once
    /// all attempts are spent.
    pub async fn execute_when<F, Fut, T, E, P>(
        &self,
        mut operation: F,
        should_retry: P,
    ) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
        P: Fn(&E) -> bool,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 0usize;
        let should_retry = &should_retry;

        Retry::spawn(self.delays(), || {
            attempt += 1;
            let current = attempt;
            let call = operation();
            async move {
                match call.await {
                    Ok(value) => {
                        if current > 1 {
                            debug!(attempt = current, "Operation succeeded after retry");
                        }
                        Ok(value)
                    }
                    Err(e) if !should_retry(&e) => {
                        warn!(attempt = current, error = %e, "Permanent error, failing immediately");
                        Err(RetryError::Permanent(e))
                    }
                    Err(e) => {
                        if current < max_attempts {
                            warn!(
                                attempt = current,
                                max_attempts,
                                error = %e,
                                "Transient error, will retry"
                            );
                        } else {
                            warn!(
                                attempt = current,
                                error = %e,
                                "Transient error, no attempts left"
                            );
                        }
                        Err(RetryError::Transient {
                            err: e,
                            retry_after: None,
                        })
                    }
                }
            }
        })
        .await
    }
}

/// Builder for `RetryPolicy`.
#[derive(Debug, Default)]
pub struct RetryPolicyBuilder {
    max_attempts: Option<usize>,
    initial_backoff: Option<Duration>,
    max_backoff: Option<Duration>,
}

impl RetryPolicyBuilder {
    /// Sets the total number of attempts.
    pub fn max_attempts(mut self, value: usize) -> Self {
        self.max_attempts = Some(value);
        self
    }

    /// Sets the upper bound of the first wait.
    pub fn initial_backoff(mut self, value: Duration) -> Self {
        self.initial_backoff = Some(value);
        self
    }

    /// Sets the cap on any single wait.
    pub fn max_backoff(mut self, value: Duration) -> Self {
        self.max_backoff = Some(value);
        self
    }

    /// Builds the `RetryPolicy`.
    pub fn build(self) -> RetryPolicy {
        let defaults = RetryPolicy::default();
        RetryPolicy {
            max_attempts: self.max_attempts.unwrap_or(defaults.max_attempts).max(1),
            initial_backoff: self.initial_backoff.unwrap_or(defaults.initial_backoff),
            max_backoff: self.max_backoff.unwrap_or(defaults.max_backoff),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_fewer_delay_than_attempts() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delays().count(), DEFAULT_MAX_ATTEMPTS - 1);
    }

    #[test]
    fn zero_attempts_clamps_to_one() {
        let policy = RetryPolicy::builder().max_attempts(0).build();
        assert_eq!(*policy.max_attempts(), 1);
        assert_eq!(policy.delays().count(), 0);
    }
}
