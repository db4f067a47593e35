//! Retry policy and executor

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

use crate::backoff::{BackoffCalculator, BackoffStrategy};

/// Retry policy configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,

    #[serde(with = "humantime_serde")]
    pub initial_delay: Duration,

    #[serde(with = "humantime_serde")]
    pub max_delay: Duration,

    pub backoff_strategy: BackoffStrategy,

    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(30),
            backoff_strategy: BackoffStrategy::Fixed,
            jitter: false,
        }
    }
}

impl RetryPolicy {
    /// Same delay between every attempt, no jitter
    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            initial_delay: delay,
            max_delay: delay,
            backoff_strategy: BackoffStrategy::Fixed,
            jitter: false,
        }
    }

    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        BackoffCalculator::new(
            self.backoff_strategy.clone(),
            self.initial_delay,
            self.max_delay,
            self.jitter,
        )
        .calculate_delay(attempt)
    }
}

/// Trait for errors that can be retried
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

/// Runs an async operation until it succeeds, fails permanently, or runs
/// out of attempts.
pub struct RetryExecutor {
    policy: RetryPolicy,
    operation: String,
}

impl RetryExecutor {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            operation: "operation".to_string(),
        }
    }

    /// Name the operation in log lines (e.g. the worker address being dialed)
    pub fn named(mut self, operation: impl Into<String>) -> Self {
        self.operation = operation.into();
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub async fn execute<F, Fut, T, E>(&self, mut f: F) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Retryable + std::fmt::Display,
    {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            debug!(
                "{}: attempt {} of {}",
                self.operation, attempt, max_attempts
            );

            match f().await {
                Ok(result) => {
                    if attempt > 1 {
                        info!("{} succeeded after {} attempts", self.operation, attempt);
                    }
                    return Ok(result);
                }
                Err(error) => {
                    if !error.is_retryable() {
                        warn!("{} failed with non-retryable error: {}", self.operation, error);
                        return Err(RetryError::NonRetryableError(error));
                    }

                    if attempt >= max_attempts {
                        warn!(
                            "{} failed after {} attempts: {}",
                            self.operation, attempt, error
                        );
                        return Err(RetryError::MaxAttemptsExceeded {
                            attempts: attempt,
                            last_error: error,
                        });
                    }

                    let delay = self.policy.delay_for_attempt(attempt);
                    warn!(
                        "{} attempt {} failed: {}. Retrying in {:?}",
                        self.operation, attempt, error, delay
                    );
                    sleep(delay).await;

                    attempt += 1;
                }
            }
        }
    }
}

/// Retry error types
#[derive(Debug, thiserror::Error)]
pub enum RetryError<E> {
    #[error("Maximum retry attempts ({attempts}) exceeded. Last error: {last_error}")]
    MaxAttemptsExceeded { attempts: u32, last_error: E },

    #[error("Non-retryable error: {0}")]
    NonRetryableError(E),
}

impl<E> RetryError<E> {
    /// The error from the final attempt
    pub fn into_inner(self) -> E {
        match self {
            RetryError::MaxAttemptsExceeded { last_error, .. } => last_error,
            RetryError::NonRetryableError(error) => error,
        }
    }

    pub fn attempts(&self) -> Option<u32> {
        match self {
            RetryError::MaxAttemptsExceeded { attempts, .. } => Some(*attempts),
            RetryError::NonRetryableError(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[derive(Debug, Clone)]
    struct DialFailure {
        retryable: bool,
    }

    impl std::fmt::Display for DialFailure {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "connection refused")
        }
    }

    impl Retryable for DialFailure {
        fn is_retryable(&self) -> bool {
            self.retryable
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_success_after_failures() {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let executor =
            RetryExecutor::new(RetryPolicy::fixed(3, Duration::from_secs(2))).named("dial bench-1:1717");

        let result = executor
            .execute(|| {
                let count = counter_clone.fetch_add(1, Ordering::Relaxed);
                async move {
                    if count < 2 {
                        Err(DialFailure { retryable: true })
                    } else {
                        Ok("connected")
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), "connected");
        assert_eq!(counter.load(Ordering::Relaxed), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_max_attempts_exceeded() {
        let executor = RetryExecutor::new(RetryPolicy::fixed(2, Duration::from_millis(10)));

        let result: Result<(), RetryError<DialFailure>> = executor
            .execute(|| async { Err(DialFailure { retryable: true }) })
            .await;

        let err = result.unwrap_err();
        assert_eq!(err.attempts(), Some(2));
        assert!(matches!(err, RetryError::MaxAttemptsExceeded { .. }));
    }

    #[tokio::test]
    async fn test_non_retryable_error_stops_immediately() {
        let calls = Arc::new(AtomicU32::new(0));
        let calls_clone = calls.clone();
        let executor = RetryExecutor::new(RetryPolicy::default());

        let result: Result<(), RetryError<DialFailure>> = executor
            .execute(|| {
                calls_clone.fetch_add(1, Ordering::Relaxed);
                async { Err(DialFailure { retryable: false }) }
            })
            .await;

        assert!(matches!(result.unwrap_err(), RetryError::NonRetryableError(_)));
        assert_eq!(calls.load(Ordering::Relaxed), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exponential_policy_waits_longer_each_attempt() {
        let policy = RetryPolicy {
            max_attempts: 3,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
            backoff_strategy: BackoffStrategy::Exponential { base: 2.0 },
            jitter: false,
        };
        let executor = RetryExecutor::new(policy);

        let start = tokio::time::Instant::now();
        let result: Result<(), RetryError<DialFailure>> = executor
            .execute(|| async { Err(DialFailure { retryable: true }) })
            .await;

        assert_eq!(result.unwrap_err().attempts(), Some(3));
        // 1s after the first attempt, 2s after the second
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(3));
        assert!(elapsed < Duration::from_secs(4));
    }

    #[tokio::test]
    async fn test_single_attempt_policy() {
        let executor = RetryExecutor::new(RetryPolicy::fixed(1, Duration::ZERO));
        let result: Result<(), RetryError<DialFailure>> = executor
            .execute(|| async { Err(DialFailure { retryable: true }) })
            .await;
        assert_eq!(result.unwrap_err().attempts(), Some(1));
    }

    #[test]
    fn test_policy_from_yaml() {
        let yaml = r#"
max_attempts: 4
initial_delay: 2s
max_delay: 1m
backoff_strategy:
  type: linear
"#;
        let policy: RetryPolicy = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(policy.max_attempts, 4);
        assert_eq!(policy.max_delay, Duration::from_secs(60));
        assert_eq!(policy.delay_for_attempt(2), Duration::from_secs(4));
        assert!(!policy.jitter);
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let policy: RetryPolicy = serde_yaml::from_str("max_attempts: 5").unwrap();
        assert_eq!(policy.max_attempts, 5);
        assert_eq!(policy.backoff_strategy, BackoffStrategy::Fixed);
        assert_eq!(policy.delay_for_attempt(4), Duration::from_secs(2));
    }
}
