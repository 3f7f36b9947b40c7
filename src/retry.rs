//! Bounded retry with a fixed backoff between attempts.

use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::warn;

/// Attempt count and fixed pause between attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    attempts: u32,
    backoff: Duration,
}

impl RetryPolicy {
    /// Build a policy; attempt counts below one are normalized to a single attempt
    pub fn new(attempts: i32, backoff: Duration) -> Self {
        Self {
            attempts: attempts.max(1) as u32,
            backoff,
        }
    }

    pub fn from_millis(attempts: i32, backoff_ms: u64) -> Self {
        Self::new(attempts, Duration::from_millis(backoff_ms))
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn backoff(&self) -> Duration {
        self.backoff
    }

    /// Run `op` until it succeeds or the attempts are exhausted, sleeping the
    /// backoff between attempts but never after the last one. `op` receives the
    /// 1-based attempt number. The last error is returned on exhaustion.
    pub async fn run<T, E, F, Fut>(&self, operation: &str, op: F) -> Result<T, E>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        self.run_until(operation, None, op).await
    }

    /// Like [`RetryPolicy::run`], but gives up early when the next attempt could
    /// only start at or after `deadline`.
    pub async fn run_until<T, E, F, Fut>(
        &self,
        operation: &str,
        deadline: Option<Instant>,
        mut op: F,
    ) -> Result<T, E>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        let mut attempt = 1;
        loop {
            match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(e) if attempt >= self.attempts => return Err(e),
                Err(e) if deadline.is_some_and(|d| Instant::now() + self.backoff >= d) => {
                    warn!(operation, attempt, error = %e, "Deadline reached, giving up");
                    return Err(e);
                }
                Err(e) => {
                    warn!(
                        operation,
                        attempt,
                        max_attempts = self.attempts,
                        backoff_ms = self.backoff.as_millis() as u64,
                        error = %e,
                        "Attempt failed, retrying"
                    );
                    sleep(self.backoff).await;
                    attempt += 1;
                }
            }
        }
    }
}
