//! Bounded retries for the remote calls of an exchange.
//!
//! Only errors reporting [`LlmError::is_retryable`] are retried. The wait
//! before retry `n` is `base_delay * 2^n`, capped at `max_delay`, with up to
//! 10% jitter either way.

use std::future::Future;
use std::time::Duration;

use rand::Rng;

use crate::error::{ExchangeStage, LlmError};

const JITTER_SPREAD: f64 = 0.1;

#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    attempts: u32,
    base_delay: Duration,
    max_delay: Duration,
    jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            jitter: true,
        }
    }
}

impl RetryPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// A single attempt, no retries.
    pub fn none() -> Self {
        Self::default().with_attempts(1)
    }

    /// Total attempts per remote call, the first one included. Zero counts as one.
    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts.max(1);
        self
    }

    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Wait before retry `retry` (0 for the first retry).
    pub fn backoff(&self, retry: u32) -> Duration {
        let delay = 2u32
            .checked_pow(retry)
            .and_then(|factor| self.base_delay.checked_mul(factor))
            .map_or(self.max_delay, |d| d.min(self.max_delay));
        if self.jitter { jittered(delay) } else { delay }
    }

    /// Run the remote call for `stage`, retrying transient failures.
    ///
    /// The error that ends the loop comes back tagged with `stage`.
    pub async fn run<F, Fut, T>(&self, stage: ExchangeStage, mut call: F) -> Result<T, LlmError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, LlmError>>,
    {
        let mut attempt = 1;
        loop {
            match call().await {
                Ok(value) => return Ok(value),
                Err(err) if attempt < self.attempts && err.is_retryable() => {
                    let delay = self.backoff(attempt - 1);
                    tracing::warn!(
                        %stage,
                        attempt,
                        attempts = self.attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "remote call failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err.at_stage(stage)),
            }
        }
    }
}

fn jittered(delay: Duration) -> Duration {
    let secs = delay.as_secs_f64();
    let spread = secs * JITTER_SPREAD;
    if spread <= 0.0 {
        return delay;
    }
    let offset = rand::thread_rng().gen_range(-spread..=spread);
    Duration::from_secs_f64((secs + offset).max(0.0))
}
