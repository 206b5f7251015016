//! Retry executor for portal network steps
//!
//! Wraps a single network operation with bounded retries against an
//! explicitly configured delay schedule. The schedule is carried as data
//! (default 1s, 3s, 6s, tuned against the live portal) rather than
//! derived from a base/multiplier formula, so the calibrated behavior
//! survives reconfiguration.
//!
//! Only transient failures are retried; a non-transient failure aborts on the
//! first attempt and is surfaced separately so callers can classify it as a
//! workflow error rather than a connectivity problem.

use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::utils::error::FetchError;

/// Retry policy backed by an explicit delay schedule.
///
/// The number of attempts is `delays.len() + 1`: one initial attempt plus one
/// retry per configured delay.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    delays: Vec<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_secs(&[1, 3, 6])
    }
}

impl RetryPolicy {
    pub fn new(delays: Vec<Duration>) -> Self {
        Self { delays }
    }

    /// Build a policy from whole-second delays (configuration form)
    pub fn from_secs(secs: &[u64]) -> Self {
        Self {
            delays: secs.iter().map(|&s| Duration::from_secs(s)).collect(),
        }
    }

    /// Total attempts this policy allows, including the first
    pub fn max_attempts(&self) -> u32 {
        self.delays.len() as u32 + 1
    }

    /// The configured delay schedule
    pub fn delays(&self) -> &[Duration] {
        &self.delays
    }

    /// Delay to wait after the given 1-based failed attempt
    fn delay_after(&self, attempt: u32) -> Duration {
        self.delays
            .get(attempt.saturating_sub(1) as usize)
            .copied()
            .unwrap_or_default()
    }
}

/// Failure surfaced by [`run_with_retry`]
#[derive(Error, Debug)]
pub enum RetryError {
    /// All attempts failed transiently; the next tick may succeed
    #[error("retries exhausted after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: FetchError },

    /// A non-transient failure occurred; retrying would not help
    #[error("non-retryable failure: {0}")]
    Fatal(FetchError),
}

/// Execute an operation with retries per the policy's delay schedule.
///
/// Transient errors ([`FetchError::is_transient`]) are retried until the
/// schedule is exhausted; any other error returns [`RetryError::Fatal`]
/// immediately. `label` identifies the workflow step in log output.
pub async fn run_with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    label: &str,
    operation: F,
) -> Result<T, RetryError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
{
    let mut attempt = 0u32;

    loop {
        attempt += 1;

        match operation().await {
            Ok(result) => {
                if attempt > 1 {
                    debug!(step = label, attempt, "Step succeeded after retry");
                }
                return Ok(result);
            }
            Err(e) if e.is_transient() => {
                if attempt >= policy.max_attempts() {
                    warn!(step = label, attempt, error = %e, "Retries exhausted");
                    return Err(RetryError::Exhausted { attempts: attempt, last: e });
                }

                let delay = policy.delay_after(attempt);
                warn!(
                    step = label,
                    attempt,
                    max_attempts = policy.max_attempts(),
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Step failed, retrying after delay"
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => {
                warn!(step = label, error = %e, "Non-retryable failure");
                return Err(RetryError::Fatal(e));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_success_first_attempt() {
        let policy = RetryPolicy::default();
        let result = run_with_retry(&policy, "step", || async { Ok::<_, FetchError>(42) }).await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_failures_then_success() {
        let policy = RetryPolicy::default();
        let attempts = Arc::new(AtomicU32::new(0));
        let attempts_clone = Arc::clone(&attempts);

        let start = tokio::time::Instant::now();
        let result = run_with_retry(&policy, "step", move || {
            let attempts = Arc::clone(&attempts_clone);
            async move {
                let count = attempts.fetch_add(1, Ordering::SeqCst);
                if count < 2 {
                    Err(FetchError::ServerError(503))
                } else {
                    Ok(42)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);

        // Two retries were delayed by the first two schedule entries: 1s + 3s
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(4), "elapsed: {elapsed:?}");
        assert!(elapsed < Duration::from_secs(5), "elapsed: {elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_is_transient() {
        let policy = RetryPolicy::from_secs(&[1, 3]);
        let attempts = Arc::new(AtomicU32::new(0));
        let attempts_clone = Arc::clone(&attempts);

        let result: Result<(), RetryError> = run_with_retry(&policy, "step", move || {
            let attempts = Arc::clone(&attempts_clone);
            async move {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err(FetchError::Timeout)
            }
        })
        .await;

        assert_eq!(attempts.load(Ordering::SeqCst), 3);
        match result.unwrap_err() {
            RetryError::Exhausted { attempts, last } => {
                assert_eq!(attempts, 3);
                assert!(matches!(last, FetchError::Timeout));
            }
            other => panic!("expected Exhausted, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_fatal_error_no_retry() {
        let policy = RetryPolicy::default();
        let attempts = Arc::new(AtomicU32::new(0));
        let attempts_clone = Arc::clone(&attempts);

        let result: Result<(), RetryError> = run_with_retry(&policy, "step", move || {
            let attempts = Arc::clone(&attempts_clone);
            async move {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err(FetchError::ClientError(400))
            }
        })
        .await;

        // Exactly one attempt, classified as fatal
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
        assert!(matches!(
            result.unwrap_err(),
            RetryError::Fatal(FetchError::ClientError(400))
        ));
    }

    #[test]
    fn test_policy_schedule() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts(), 4);
        assert_eq!(
            policy.delays(),
            &[
                Duration::from_secs(1),
                Duration::from_secs(3),
                Duration::from_secs(6)
            ]
        );

        assert_eq!(policy.delay_after(1), Duration::from_secs(1));
        assert_eq!(policy.delay_after(3), Duration::from_secs(6));
    }

    #[test]
    fn test_empty_schedule_single_attempt() {
        let policy = RetryPolicy::from_secs(&[]);
        assert_eq!(policy.max_attempts(), 1);
    }
}
