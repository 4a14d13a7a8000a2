//! Retry-with-cooldown for throttled provider calls.
//!
//! The cooldown is a blocking wait: while it runs no other document of the
//! same run makes progress.

use std::time::Duration;

use tracing::{debug, warn};

/// How often and how patiently a throttled call is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    /// Fixed wait between attempts.
    pub cooldown: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            cooldown: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Create a policy with the given attempt budget and cooldown.
    pub fn new(max_attempts: u32, cooldown: Duration) -> Self {
        Self {
            max_attempts,
            cooldown,
        }
    }

    /// A policy that never retries.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            cooldown: Duration::ZERO,
        }
    }
}

/// Something that can wait out a cooldown window.
pub trait Cooldown {
    /// Block for `duration`.
    fn wait(&self, duration: Duration);
}

/// Cooldown backed by [`std::thread::sleep`].
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadCooldown;

impl Cooldown for ThreadCooldown {
    fn wait(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Why a retried operation gave up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryError<E> {
    /// Every attempt failed with a retryable error; `last` is the final one.
    Exhausted { attempts: u32, last: E },
    /// The operation failed with an error that is not retried.
    Permanent(E),
}

/// Run `op`, waiting out `policy.cooldown` and trying again whenever it fails
/// with an error for which `is_retryable` holds.
///
/// No wait happens after the final attempt.
pub fn with_retry<T, E, F, P>(
    policy: &RetryPolicy,
    cooldown: &dyn Cooldown,
    operation: &str,
    is_retryable: P,
    mut op: F,
) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Result<T, E>,
    P: Fn(&E) -> bool,
    E: std::fmt::Display,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match op() {
            Ok(value) => {
                if attempt > 1 {
                    debug!(operation, attempt, "succeeded after retry");
                }
                return Ok(value);
            }
            Err(e) if is_retryable(&e) => {
                if attempt >= max_attempts {
                    warn!(operation, attempts = attempt, error = %e, "giving up after repeated rate limiting");
                    return Err(RetryError::Exhausted {
                        attempts: attempt,
                        last: e,
                    });
                }
                warn!(
                    operation,
                    attempt,
                    max_attempts,
                    cooldown_secs = policy.cooldown.as_secs(),
                    error = %e,
                    "rate limited, cooling down before retrying"
                );
                cooldown.wait(policy.cooldown);
                attempt += 1;
            }
            Err(e) => return Err(RetryError::Permanent(e)),
        }
    }
}
