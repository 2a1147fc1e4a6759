//! Retry loop for transient failures.
//!
//! The loop is an explicit state machine so the decision of "retry or stop" can be
//! tested without a network:
//!
//! ```text
//! Attempting(k) --ok--------------------------> Succeeded
//! Attempting(k) --permanent error-------------> PermanentFailure
//! Attempting(k) --transient error, k < max----> Backoff(k) --sleep--> Attempting(k+1)
//! Attempting(k) --transient error, k == max---> ExhaustedRetries
//! ```

use crate::config::ClientConfig;
use crate::error::{Error, Result};
use log::{error, warn};
use std::time::Duration;

/// Blocks the current thread between attempts.
pub trait Sleeper {
    fn sleep(&self, delay: Duration);
}

/// Production sleeper backed by `std::thread::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, delay: Duration) {
        std::thread::sleep(delay);
    }
}

impl<S: Sleeper + ?Sized> Sleeper for &S {
    fn sleep(&self, delay: Duration) {
        (**self).sleep(delay)
    }
}

#[derive(Debug)]
pub enum RetryState<T> {
    Attempting { attempt: u32 },
    Backoff { attempt: u32, delay: Duration, last: Error },
    Succeeded(T),
    ExhaustedRetries { attempts: u32, last: Error },
    PermanentFailure(Error),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff_factor: f64,
    pub unit: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&ClientConfig::default())
    }
}

impl From<&ClientConfig> for RetryPolicy {
    fn from(cfg: &ClientConfig) -> Self {
        Self {
            max_retries: cfg.max_retries,
            backoff_factor: cfg.backoff_factor,
            unit: cfg.backoff_unit,
        }
    }
}

impl RetryPolicy {
    /// Total attempts; a zero budget still makes one attempt.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.max(1)
    }

    /// Delay between attempt `attempt` and `attempt + 1`: `unit * factor^(attempt-1)`.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let secs = self.unit.as_secs_f64() * self.backoff_factor.powi(exp);
        Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
    }

    /// Transition out of `Attempting { attempt }` given that attempt's result.
    pub fn next_state<T>(&self, attempt: u32, result: Result<T>) -> RetryState<T> {
        match result {
            Ok(v) => RetryState::Succeeded(v),
            Err(e) if !e.is_retriable() => RetryState::PermanentFailure(e),
            Err(e) if attempt >= self.max_attempts() => RetryState::ExhaustedRetries {
                attempts: attempt,
                last: e,
            },
            Err(e) => RetryState::Backoff {
                attempt,
                delay: self.delay_after(attempt),
                last: e,
            },
        }
    }

    /// Drive `op` until it succeeds, fails permanently, or the budget runs out.
    ///
    /// `op` receives the 1-based attempt number.
    pub fn run<T, S, F>(&self, sleeper: &S, mut op: F) -> Result<T>
    where
        S: Sleeper + ?Sized,
        F: FnMut(u32) -> Result<T>,
    {
        let mut state = RetryState::Attempting { attempt: 1 };
        loop {
            state = match state {
                RetryState::Attempting { attempt } => self.next_state(attempt, op(attempt)),
                RetryState::Backoff {
                    attempt,
                    delay,
                    last,
                } => {
                    warn!("{last}");
                    warn!(
                        "Retrying (attempt {}/{}) in {:.1} seconds...",
                        attempt + 1,
                        self.max_attempts(),
                        delay.as_secs_f64()
                    );
                    sleeper.sleep(delay);
                    RetryState::Attempting {
                        attempt: attempt + 1,
                    }
                }
                RetryState::Succeeded(v) => return Ok(v),
                RetryState::ExhaustedRetries { attempts, last } => {
                    error!("Exceeded max retries ({attempts}): {last}");
                    return Err(Error::RetriesExhausted {
                        attempts,
                        status: last.status(),
                        source: Box::new(last),
                    });
                }
                RetryState::PermanentFailure(e) => {
                    error!("Non-retriable error: {e}");
                    return Err(e);
                }
            };
        }
    }
}
