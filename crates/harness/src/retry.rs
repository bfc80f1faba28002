//! Bounded retry combinator.
//!
//! Flaky browser interactions (navigation, clicks behind overlays) are
//! wrapped in [`retry`], which re-runs an async operation until it succeeds
//! or the attempt budget is spent. Session failures are returned at once;
//! retrying against a dead browser cannot succeed.

use crate::result::{HarnessError, HarnessResult};
use std::future::Future;
use std::time::Duration;
use tracing::{error, info, warn};

/// Attempt budget and delay schedule
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    /// Pause after the first failed attempt
    pub delay: Duration,
    /// Multiplier applied to the pause after each further failure
    pub backoff: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::with_extra_attempts(crate::config::DEFAULT_MAX_RETRIES, Duration::from_secs(2))
    }
}

impl RetryPolicy {
    /// Policy with a fixed delay
    #[must_use]
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
            backoff: 1.0,
        }
    }

    /// One attempt plus `retries` extra attempts
    #[must_use]
    pub fn with_extra_attempts(retries: u32, delay: Duration) -> Self {
        Self::new(retries.saturating_add(1), delay)
    }

    /// Set backoff multiplier
    #[must_use]
    pub fn with_backoff(mut self, backoff: f64) -> Self {
        self.backoff = backoff;
        self
    }

    /// Pause after the `attempt`-th failure (1-based)
    #[must_use]
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt.saturating_sub(1)).unwrap_or(i32::MAX);
        self.delay.mul_f64(self.backoff.max(0.0).powi(exponent))
    }
}

/// Run `op` until it succeeds or the policy's attempts are used up
///
/// `op` receives the 1-based attempt number.
///
/// # Errors
///
/// Returns [`HarnessError::RetriesExhausted`] wrapping the last failure, or a
/// session failure unchanged as soon as it occurs.
pub async fn retry<T, F, Fut>(policy: &RetryPolicy, operation: &str, mut op: F) -> HarnessResult<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = HarnessResult<T>>,
{
    let attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match op(attempt).await {
            Ok(value) => {
                if attempt > 1 {
                    info!(operation, attempt, "Succeeded after retry");
                }
                return Ok(value);
            }
            Err(e) if e.is_session_failure() => {
                error!(operation, attempt, error = %e, "Session failure, not retrying");
                return Err(e);
            }
            Err(e) if attempt >= attempts => {
                error!(operation, attempts = attempt, error = %e, "All attempts failed");
                return Err(HarnessError::RetriesExhausted {
                    operation: operation.to_string(),
                    attempts: attempt,
                    source: Box::new(e),
                });
            }
            Err(e) => {
                let pause = policy.delay_after(attempt);
                warn!(
                    operation,
                    attempt,
                    max_attempts = attempts,
                    retry_in_ms = pause.as_millis() as u64,
                    error = %e,
                    "Attempt failed"
                );
                tokio::time::sleep(pause).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn quick(attempts: u32) -> RetryPolicy {
        RetryPolicy::new(attempts, Duration::from_millis(1))
    }

    mod policy {
        use super::*;

        #[test]
        fn test_default_is_three_attempts() {
            let policy = RetryPolicy::default();
            assert_eq!(policy.max_attempts, 3);
            assert_eq!(policy.delay, Duration::from_secs(2));
        }

        #[test]
        fn test_fixed_delay() {
            let policy = RetryPolicy::new(3, Duration::from_millis(100));
            assert_eq!(policy.delay_after(1), Duration::from_millis(100));
            assert_eq!(policy.delay_after(3), Duration::from_millis(100));
        }

        #[test]
        fn test_backoff() {
            let policy = RetryPolicy::new(4, Duration::from_millis(100)).with_backoff(2.0);
            assert_eq!(policy.delay_after(1), Duration::from_millis(100));
            assert_eq!(policy.delay_after(2), Duration::from_millis(200));
            assert_eq!(policy.delay_after(3), Duration::from_millis(400));
        }
    }

    mod combinator {
        use super::*;

        #[tokio::test]
        async fn test_succeeds_after_transient_failures() {
            let calls = Cell::new(0);
            let value = retry(&quick(3), "flaky", |attempt| {
                calls.set(calls.get() + 1);
                async move {
                    if attempt < 3 {
                        Err(HarnessError::driver("not yet"))
                    } else {
                        Ok(attempt)
                    }
                }
            })
            .await
            .unwrap();
            assert_eq!(value, 3);
            assert_eq!(calls.get(), 3);
        }

        #[tokio::test]
        async fn test_exhaustion_wraps_last_error() {
            let err = retry::<(), _, _>(&quick(3), "click", |attempt| async move {
                Err(HarnessError::driver(format!("failure {attempt}")))
            })
            .await
            .unwrap_err();
            match err {
                HarnessError::RetriesExhausted {
                    operation,
                    attempts,
                    source,
                } => {
                    assert_eq!(operation, "click");
                    assert_eq!(attempts, 3);
                    assert!(source.to_string().contains("failure 3"));
                }
                other => panic!("unexpected error: {other}"),
            }
        }

        #[tokio::test]
        async fn test_session_failure_is_not_retried() {
            let calls = Cell::new(0);
            let err = retry::<(), _, _>(&quick(5), "navigate", |_| {
                calls.set(calls.get() + 1);
                async {
                    Err(HarnessError::SessionDead {
                        message: "gone".to_string(),
                    })
                }
            })
            .await
            .unwrap_err();
            assert!(err.is_session_failure());
            assert_eq!(calls.get(), 1);
        }

        #[tokio::test]
        async fn test_zero_attempts_still_runs_once() {
            let value = retry(&quick(0), "once", |_| async { Ok(7) }).await.unwrap();
            assert_eq!(value, 7);
        }
    }
}
