//! Shared retry primitive for bounded lookups
//!
//! Both the field fetcher and the initial post-list wait retry the same
//! way: a fixed attempt budget with a fixed pause between attempts. What
//! differs is the exhaustion policy - the field fetcher resolves to a
//! default value, the post-list wait escalates to a fatal error - so
//! exhaustion is returned to the caller to decide, not handled here.

use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// A bounded retry budget: up to `max_attempts` tries with `delay` between
/// consecutive attempts. No backoff growth; the pipeline's waits are short
/// and fixed by design.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    max_attempts: u32,
    delay: Duration,
}

/// All attempts failed; carries the final attempt's error.
#[derive(Debug)]
pub struct Exhausted<E> {
    pub attempts: u32,
    pub last_error: E,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            // A zero budget would mean "never try"; clamp to one attempt.
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Run `op` until it succeeds or the attempt budget is exhausted.
    ///
    /// The operation receives the 1-based attempt number. The delay is
    /// inserted between attempts only, never after the final failure.
    pub async fn run<T, E, F, Fut>(&self, mut op: F) -> Result<T, Exhausted<E>>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        let mut attempt = 1;
        loop {
            match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(error) if attempt >= self.max_attempts => {
                    return Err(Exhausted {
                        attempts: self.max_attempts,
                        last_error: error,
                    });
                }
                Err(error) => {
                    debug!(
                        "Attempt {}/{} failed: {}, retrying in {:?}",
                        attempt, self.max_attempts, error, self.delay
                    );
                    if !self.delay.is_zero() {
                        tokio::time::sleep(self.delay).await;
                    }
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn returns_first_success_without_extra_attempts() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::new(3, Duration::ZERO);

        let result: Result<u32, Exhausted<String>> = policy
            .run(|_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok(42) }
            })
            .await;

        assert_eq!(result.expect("first attempt succeeds"), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn exhausts_after_exactly_max_attempts() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::new(3, Duration::ZERO);

        let result: Result<u32, Exhausted<String>> = policy
            .run(|_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err("nope".to_string()) }
            })
            .await;

        let exhausted = result.expect_err("all attempts fail");
        assert_eq!(exhausted.attempts, 3);
        assert_eq!(exhausted.last_error, "nope");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn recovers_on_a_later_attempt() {
        let policy = RetryPolicy::new(3, Duration::ZERO);

        let result: Result<u32, Exhausted<String>> = policy
            .run(|attempt| async move {
                if attempt < 2 {
                    Err("warming up".to_string())
                } else {
                    Ok(attempt)
                }
            })
            .await;

        assert_eq!(result.expect("second attempt succeeds"), 2);
    }

    #[test]
    fn zero_attempt_budget_is_clamped_to_one() {
        assert_eq!(RetryPolicy::new(0, Duration::ZERO).max_attempts(), 1);
    }
}
