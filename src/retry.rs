//! Retry with exponential back-off for external service calls.
//!
//! [`with_retries`] is the only place in the crate that sleeps. It blocks
//! the calling thread only, so concurrent detections are unaffected.

use std::fmt;
use std::thread;
use std::time::Duration;

use tracing::warn;

/// How many times to try an operation and how long to wait between tries.
///
/// The wait before retry `n` (zero-based) is `initial_delay * 2^n`. There is
/// no wait after the final attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub initial_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            initial_delay: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    pub const fn new(attempts: u32, initial_delay: Duration) -> Self {
        Self {
            attempts,
            initial_delay,
        }
    }

    /// Delay to sleep after the failed attempt with the given zero-based index.
    pub fn delay_after(&self, attempt_index: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt_index).unwrap_or(u32::MAX);
        self.initial_delay.saturating_mul(factor)
    }
}

/// Every attempt failed; carries the most recent error.
#[derive(Debug)]
pub struct RetryExhausted<E> {
    pub attempts: u32,
    pub last_error: E,
}

impl<E: fmt::Display> fmt::Display for RetryExhausted<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gave up after {} attempt(s): {}", self.attempts, self.last_error)
    }
}

impl<E: fmt::Debug + fmt::Display> std::error::Error for RetryExhausted<E> {}

/// Run `operation` until it succeeds or `policy.attempts` tries have failed.
///
/// A policy with zero attempts still runs the operation once.
pub fn with_retries<T, E, F>(policy: RetryPolicy, operation: F) -> Result<T, RetryExhausted<E>>
where
    E: fmt::Display,
    F: FnMut() -> Result<T, E>,
{
    with_retries_if(policy, |_| true, operation)
}

/// Like [`with_retries`], but an error for which `is_retriable` returns
/// false is returned at once, without sleeping.
pub fn with_retries_if<T, E, F, P>(
    policy: RetryPolicy,
    is_retriable: P,
    mut operation: F,
) -> Result<T, RetryExhausted<E>>
where
    E: fmt::Display,
    F: FnMut() -> Result<T, E>,
    P: Fn(&E) -> bool,
{
    let attempts = policy.attempts.max(1);
    let mut attempt = 0u32;

    loop {
        match operation() {
            Ok(value) => return Ok(value),
            Err(err) => {
                attempt += 1;
                if attempt >= attempts || !is_retriable(&err) {
                    return Err(RetryExhausted {
                        attempts: attempt,
                        last_error: err,
                    });
                }

                let delay = policy.delay_after(attempt - 1);
                warn!(
                    attempt,
                    attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "external call failed, retrying after back-off"
                );
                if !delay.is_zero() {
                    thread::sleep(delay);
                }
            }
        }
    }
}
