//! Bounded retry with exponential backoff for the external calls.

use crate::error::ReviewResult;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// How often and how patiently to retry a fallible external call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts after the first one.
    pub max_retries: u32,
    /// Delay before the first retry; doubles with each retry.
    pub initial_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, initial_delay: Duration) -> Self {
        Self {
            max_retries,
            initial_delay,
        }
    }

    pub fn none() -> Self {
        Self::new(0, Duration::ZERO)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(100))
    }
}

/// Run `operation` until it succeeds, fails with a non-retryable error,
/// or the policy is exhausted. The last error is returned.
pub async fn with_retry<T, F, Fut>(
    label: &str,
    policy: RetryPolicy,
    mut operation: F,
) -> ReviewResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ReviewResult<T>>,
{
    let mut delay = policy.initial_delay;
    let mut attempt = 0;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() && attempt < policy.max_retries => {
                attempt += 1;
                warn!(
                    "{} failed (attempt {}/{}): {}. Retrying in {}ms",
                    label,
                    attempt,
                    policy.max_retries + 1,
                    e,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
                delay *= 2;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::AnalyzerKind;
    use crate::error::ReviewError;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn test_succeeds_after_transient_failures() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let policy = RetryPolicy::new(3, Duration::from_millis(1));
        let result = with_retry("fetch", policy, move || async move {
            if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(ReviewError::Provider("flaky".to_string()))
            } else {
                Ok(42)
            }
        })
        .await;

        assert_eq!(result, Ok(42));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let policy = RetryPolicy::new(2, Duration::from_millis(1));
        let result: ReviewResult<()> = with_retry("synthesis", policy, move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(ReviewError::Synthesis("down".to_string()))
        })
        .await;

        assert!(matches!(result, Err(ReviewError::Synthesis(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_non_retryable_fails_immediately() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let policy = RetryPolicy::default();
        let result: ReviewResult<()> = with_retry("analysis", policy, move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(ReviewError::EmptyDataset {
                analyzer: AnalyzerKind::Revenue,
            })
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
