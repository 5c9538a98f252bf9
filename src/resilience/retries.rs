//! Retry state machine.
//!
//! # States
//! ```text
//! Attempting(1) ──ok──▶ Succeeded
//!      │ transport error, sleep 1 × base
//!      ▼
//! Attempting(2) ──ok──▶ Succeeded
//!      │ ...
//!      ▼
//! Attempting(max) ──error──▶ Exhausted
//! ```
//!
//! Each attempt is produced fresh by the caller's closure, so nothing from a
//! failed attempt leaks into the next one. No sleep follows the final failure.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use crate::config::schema::RetryConfig;
use crate::observability::metrics;
use crate::resilience::backoff::linear_backoff;

/// Terminal state of one retry loop.
#[derive(Debug, PartialEq, Eq)]
pub enum RetryOutcome<T> {
    Succeeded { value: T, attempts: u32 },
    Exhausted { attempts: u32 },
}

impl<T> RetryOutcome<T> {
    pub fn attempts(&self) -> u32 {
        match self {
            RetryOutcome::Succeeded { attempts, .. } | RetryOutcome::Exhausted { attempts } => {
                *attempts
            }
        }
    }
}

/// Bounded attempts with linear backoff.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
        }
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(
            config.max_attempts,
            Duration::from_millis(config.base_delay_ms),
        )
    }

    /// Run `operation` until it succeeds or `max_attempts` calls have failed.
    ///
    /// `operation` receives the 1-based attempt number.
    pub async fn run<T, E, F, Fut>(&self, mut operation: F) -> RetryOutcome<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let mut attempt = 1;

        while attempt <= self.max_attempts {
            match operation(attempt).await {
                Ok(value) => {
                    return RetryOutcome::Succeeded {
                        value,
                        attempts: attempt,
                    }
                }
                Err(error) => {
                    metrics::record_upstream_failure();
                    tracing::warn!(
                        attempt,
                        max_attempts = self.max_attempts,
                        error = %error,
                        "Upstream attempt failed"
                    );

                    if attempt < self.max_attempts {
                        tokio::time::sleep(linear_backoff(attempt, self.base_delay)).await;
                    }
                    attempt += 1;
                }
            }
        }

        tracing::error!(attempts = self.max_attempts, "Upstream retries exhausted");
        RetryOutcome::Exhausted {
            attempts: self.max_attempts,
        }
    }
}
