//! Bounded retries with exponential backoff for remote provider calls.
//!
//! A message post waits on detection and translation, so the policy is
//! deliberately short: a few attempts, small capped delays, and only for
//! failures the caller marks as transient.

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts including the first. Zero is treated as one.
    pub attempts: u32,
    /// Wait before the second attempt
    pub base_delay: Duration,
    /// Upper bound for any single wait
    pub max_delay: Duration,
    /// Growth factor between consecutive waits
    pub factor: f64,
}

impl RetryPolicy {
    pub fn new(attempts: u32, base_delay: Duration) -> Self {
        Self {
            attempts,
            base_delay,
            max_delay: Duration::from_secs(30),
            factor: 2.0,
        }
    }

    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    /// Three attempts, waiting 500ms then 1s, never more than 2s.
    pub fn remote_call() -> Self {
        Self::new(3, Duration::from_millis(500)).with_max_delay(Duration::from_secs(2))
    }

    pub fn no_retry() -> Self {
        Self::new(1, Duration::ZERO)
    }

    fn total_attempts(&self) -> u32 {
        self.attempts.max(1)
    }

    /// Wait before attempt number `retry` (1 = first retry).
    fn backoff(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(i32::MAX as u32) as i32;
        let millis = self.base_delay.as_millis() as f64 * self.factor.powi(exponent);
        Duration::from_millis(millis as u64).min(self.max_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::remote_call()
    }
}

/// Run `call` until it succeeds, fails with an error `transient` rejects, or
/// the policy runs out of attempts. The last error is returned.
pub async fn retry_when<T, E, F, Fut, P>(
    policy: &RetryPolicy,
    label: &str,
    mut call: F,
    transient: P,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
    P: Fn(&E) -> bool,
{
    let attempts = policy.total_attempts();
    let mut attempt = 1;

    loop {
        let err = match call().await {
            Ok(value) => {
                if attempt > 1 {
                    debug!("{} succeeded on attempt {}", label, attempt);
                }
                return Ok(value);
            }
            Err(err) => err,
        };

        if !transient(&err) {
            debug!("{} failed permanently: {}", label, err);
            return Err(err);
        }

        if attempt >= attempts {
            warn!("{} gave up after {} attempt(s): {}", label, attempts, err);
            return Err(err);
        }

        let wait = policy.backoff(attempt);
        warn!(
            "{} attempt {}/{} failed ({}), retrying in {:?}",
            label, attempt, attempts, err, wait
        );
        sleep(wait).await;
        attempt += 1;
    }
}
