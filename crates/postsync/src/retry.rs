//! Fixed-delay retry policy.
//!
//! Wraps a single fallible async operation. Failures the predicate accepts
//! are retried up to `max_retries` times with the same delay before every
//! retry; anything else is returned on the spot.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::config::RetryConfig;

/// Default number of retries after the initial attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 3;
/// Default wait before each retry.
pub const DEFAULT_DELAY: Duration = Duration::from_secs(5);

/// Details handed to the retry observer before each wait.
#[derive(Debug)]
pub struct RetryAttempt<'a, E> {
    /// The failure that triggered this retry.
    pub error: &'a E,
    /// How long the policy will wait before the next attempt.
    pub delay: Duration,
    /// 1-based retry number (1 = first retry, i.e. the second attempt).
    pub attempt: u32,
}

pub struct RetryPolicy<E> {
    max_retries: u32,
    delay: Duration,
    should_retry: Arc<dyn Fn(&E) -> bool + Send + Sync>,
}

impl<E> Clone for RetryPolicy<E> {
    fn clone(&self) -> Self {
        Self {
            max_retries: self.max_retries,
            delay: self.delay,
            should_retry: Arc::clone(&self.should_retry),
        }
    }
}

impl<E> fmt::Debug for RetryPolicy<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_retries", &self.max_retries)
            .field("delay", &self.delay)
            .field("should_retry", &"<predicate>")
            .finish()
    }
}

impl<E> Default for RetryPolicy<E> {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RETRIES, DEFAULT_DELAY)
    }
}

impl<E> RetryPolicy<E> {
    /// Creates a policy that retries every failure.
    pub fn new(max_retries: u32, delay: Duration) -> Self {
        Self {
            max_retries,
            delay,
            should_retry: Arc::new(|_| true),
        }
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(config.max_retries, config.delay())
    }

    /// Restricts retries to failures for which `predicate` returns true.
    pub fn retry_if<P>(mut self, predicate: P) -> Self
    where
        P: Fn(&E) -> bool + Send + Sync + 'static,
    {
        self.should_retry = Arc::new(predicate);
        self
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Runs `operation` until it succeeds, fails with a non-retryable error,
    /// or has been retried `max_retries` times. The last error is returned
    /// unchanged.
    ///
    /// `on_retry` is called once per retry, before the wait, and never after
    /// the final attempt.
    pub async fn execute<T, Fut, Op, F>(&self, mut operation: Op, mut on_retry: F) -> Result<T, E>
    where
        Op: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        F: FnMut(&RetryAttempt<'_, E>),
    {
        let mut retries = 0;

        loop {
            let error = match operation().await {
                Ok(value) => return Ok(value),
                Err(error) => error,
            };

            if retries >= self.max_retries || !(self.should_retry)(&error) {
                return Err(error);
            }

            retries += 1;
            on_retry(&RetryAttempt {
                error: &error,
                delay: self.delay,
                attempt: retries,
            });

            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
        }
    }
}
