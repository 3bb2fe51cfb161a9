//! Caller-side retry of recoverable bridge failures.
//!
//! The engine never retries. Commands wrap each call in
//! [`RetryPolicy::run`], which repeats it only while the error says it is
//! recoverable, with exponential backoff between attempts.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use dt_bridge::CallResult;

use crate::error::advice;

/// Delay before the first retry.
pub const INITIAL_BACKOFF: Duration = Duration::from_millis(500);

/// Upper bound on a single delay.
pub const MAX_BACKOFF: Duration = Duration::from_secs(8);

/// How many times, and how patiently, to retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub retries: u32,
    /// Delay before the first retry; doubled for each next one.
    pub initial_backoff: Duration,
    /// Cap on a single delay.
    pub max_backoff: Duration,
}

impl RetryPolicy {
    /// Retry up to `retries` times with the default backoff.
    #[must_use]
    pub const fn new(retries: u32) -> Self {
        Self {
            retries,
            initial_backoff: INITIAL_BACKOFF,
            max_backoff: MAX_BACKOFF,
        }
    }

    /// Never retry.
    #[must_use]
    pub const fn none() -> Self {
        Self::new(0)
    }

    /// Set the first delay.
    #[must_use]
    pub const fn with_initial_backoff(mut self, backoff: Duration) -> Self {
        self.initial_backoff = backoff;
        self
    }

    /// Delay before retry number `attempt` (0-based).
    #[must_use]
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }

    /// Run `operation`, retrying recoverable failures.
    ///
    /// # Errors
    ///
    /// Returns the first non-recoverable error, or the last error once the
    /// retries are used up.
    pub async fn run<T, F, Fut>(&self, mut operation: F) -> CallResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = CallResult<T>>,
    {
        let mut attempt = 0;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_recoverable() && attempt < self.retries => {
                    let delay = self.backoff(attempt);
                    attempt += 1;
                    warn!(
                        attempt,
                        retries = self.retries,
                        backoff_ms = delay.as_millis() as u64,
                        "{} (will retry)",
                        advice(&err)
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::none()
    }
}
