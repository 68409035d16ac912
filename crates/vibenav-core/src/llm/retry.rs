//! Retry with exponential backoff for flaky provider calls

use crate::error::Result;
use std::future::Future;
use std::time::Duration;

/// Cap on the backoff exponent (base * 2^10)
const MAX_BACKOFF_SHIFT: u32 = 10;

/// Outcome of one attempt that reached the provider
#[derive(Debug)]
pub enum Attempt<T> {
    /// Usable result, stop retrying
    Done(T),
    /// Provider answered but the output was unusable (e.g. not JSON)
    Retry(String),
}

/// Bounded retry policy with exponential backoff.
///
/// Attempt `n` (0-based) that fails is followed by a sleep of
/// `base_delay * 2^n`. No sleep follows the final attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// Single attempt, no retry
    pub fn none() -> Self {
        Self::new(1, Duration::ZERO)
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Backoff after the given failed attempt
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay * (1u32 << attempt.min(MAX_BACKOFF_SHIFT))
    }

    /// Run `op` until it yields `Attempt::Done`, retrying soft failures and
    /// provider errors.
    ///
    /// Returns `Ok(Some(value))` on success, `Ok(None)` when the last attempt
    /// ended in a soft failure, and `Err` when the last attempt failed with an
    /// error. Errors that did not come from a provider are returned at once.
    pub async fn run<T, F, Fut>(&self, label: &str, mut op: F) -> Result<Option<T>>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<Attempt<T>>>,
    {
        for attempt in 0..self.max_attempts {
            let is_last = attempt + 1 >= self.max_attempts;

            match op(attempt).await {
                Ok(Attempt::Done(value)) => return Ok(Some(value)),
                Ok(Attempt::Retry(reason)) => {
                    tracing::warn!(
                        "{}: attempt {}/{} unusable: {}",
                        label,
                        attempt + 1,
                        self.max_attempts,
                        reason
                    );
                    if is_last {
                        return Ok(None);
                    }
                }
                Err(e) if e.is_provider_error() && !is_last => {
                    tracing::warn!(
                        "{}: attempt {}/{} failed: {}",
                        label,
                        attempt + 1,
                        self.max_attempts,
                        e
                    );
                }
                Err(e) => return Err(e),
            }

            let wait = self.delay_for(attempt);
            tracing::debug!("{}: waiting {:?} before retry", label, wait);
            tokio::time::sleep(wait).await;
        }

        Ok(None)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::VibeError;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_delays_double() {
        let policy = RetryPolicy::new(4, Duration::from_secs(1));
        assert_eq!(policy.delay_for(0), Duration::from_secs(1));
        assert_eq!(policy.delay_for(1), Duration::from_secs(2));
        assert_eq!(policy.delay_for(2), Duration::from_secs(4));
        assert_eq!(policy.delay_for(40), Duration::from_secs(1024));
    }

    #[test]
    fn test_zero_attempts_clamped() {
        assert_eq!(RetryPolicy::new(0, Duration::ZERO).max_attempts(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_soft_failures_exhaust() {
        let policy = RetryPolicy::default();
        let calls = AtomicU32::new(0);
        let start = tokio::time::Instant::now();

        let result: Option<()> = policy
            .run("test", |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok(Attempt::Retry("garbage".to_string())) }
            })
            .await
            .unwrap();

        assert!(result.is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        // 1s + 2s between three attempts, nothing after the last
        assert_eq!(start.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_provider_error_then_success() {
        let policy = RetryPolicy::default();
        let result = policy
            .run("test", |attempt| async move {
                if attempt == 0 {
                    Err(VibeError::ExternalError("429 Too Many Requests".into()))
                } else {
                    Ok(Attempt::Done(attempt))
                }
            })
            .await
            .unwrap();
        assert_eq!(result, Some(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_final_provider_error_propagates() {
        let policy = RetryPolicy::new(2, Duration::from_millis(10));
        let result: Result<Option<()>> = policy
            .run("test", |_| async {
                Err(VibeError::ExternalError("quota exceeded".into()))
            })
            .await;
        assert!(matches!(result, Err(VibeError::ExternalError(_))));
    }

    #[tokio::test]
    async fn test_local_error_not_retried() {
        let policy = RetryPolicy::new(5, Duration::from_secs(60));
        let calls = AtomicU32::new(0);
        let result: Result<Option<()>> = policy
            .run("test", |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(VibeError::InvalidInput("empty query".into())) }
            })
            .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
