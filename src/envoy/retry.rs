//! Bounded retry with randomized waits
//!
//! The Envoy is a small embedded device that occasionally drops requests or answers
//! with a 5xx while it is busy. Every request is therefore retried until a fixed
//! wall-clock budget, measured from the first attempt, is used up.
//!
//! The policy is a plain value so it can be read from configuration and exercised
//! without any HTTP in play.

use crate::error::Result;
use rand::Rng;
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::error;

/// How long to keep retrying and how long to wait between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_elapsed: Duration,
    min_wait: Duration,
    max_wait: Duration,
}

impl RetryPolicy {
    /// Create a policy. An inverted wait range is swapped rather than rejected;
    /// configuration validates the range before it gets here.
    pub fn new(max_elapsed: Duration, min_wait: Duration, max_wait: Duration) -> Self {
        let (min_wait, max_wait) = if min_wait <= max_wait {
            (min_wait, max_wait)
        } else {
            (max_wait, min_wait)
        };
        Self {
            max_elapsed,
            min_wait,
            max_wait,
        }
    }

    pub fn max_elapsed(&self) -> Duration {
        self.max_elapsed
    }

    pub fn min_wait(&self) -> Duration {
        self.min_wait
    }

    pub fn max_wait(&self) -> Duration {
        self.max_wait
    }

    /// Sample a wait uniformly from `[min_wait, max_wait]`.
    pub fn next_wait(&self) -> Duration {
        let min = self.min_wait.as_millis() as u64;
        let max = self.max_wait.as_millis() as u64;
        Duration::from_millis(rand::rng().random_range(min..=max))
    }

    /// Run `operation` until it succeeds, fails with a non-transient error, or the
    /// budget runs out. In the last two cases the error of the final attempt is
    /// returned unchanged.
    ///
    /// `target` only shows up in the log line written before each wait.
    pub async fn run<T, F, Fut>(&self, target: &str, mut operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let started = Instant::now();
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            let err = match operation().await {
                Ok(value) => return Ok(value),
                Err(e) => e,
            };

            if !err.is_transient() || started.elapsed() >= self.max_elapsed {
                return Err(err);
            }

            let wait = self.next_wait();
            error!(
                "Attempt {} for {} failed, retrying in {:.3}s: {}",
                attempt,
                target,
                wait.as_secs_f64(),
                err
            );
            tokio::time::sleep(wait).await;
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(
            Duration::from_secs(30),
            Duration::from_secs(1),
            Duration::from_secs(2),
        )
    }
}
