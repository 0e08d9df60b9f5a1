//! Bounded retry with a fixed escalating delay schedule
//!
//! Transient failures (connection errors, unusable responses) are retried
//! up to a configured number of attempts, waiting a little longer before
//! each one; the schedule's last entry repeats once exhausted. Permanent
//! failures (API business errors, classification failures, local I/O) are
//! returned immediately.
//!
//! This is deliberately a *same-operation* resilience layer. Trying a
//! different source URL for the same asset is the transfer engine's job
//! ([`crate::transfer`]); the two are kept separate because their failure
//! semantics differ.

use crate::config::RetryConfig;
use crate::error::Error;
use std::future::Future;

/// Trait for errors that can be classified as retryable or not
///
/// Transient failures (timeouts, connection resets, garbled responses)
/// should return `true`. Permanent failures (business errors, bad input,
/// disk problems) should return `false`.
pub trait IsRetryable {
    /// Returns true if the error is transient and the operation should be retried
    fn is_retryable(&self) -> bool;
}

impl IsRetryable for Error {
    fn is_retryable(&self) -> bool {
        match self {
            // Transport failures are worth another attempt
            Error::Network(e) => e.is_timeout() || e.is_connect() || e.is_body() || e.is_decode(),
            // Non-200 statuses, empty bodies and malformed payloads are
            // frequently transient on this platform
            Error::UnexpectedResponse { .. } => true,
            // Some I/O failures are transient network conditions surfacing locally
            Error::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::TimedOut
                    | std::io::ErrorKind::ConnectionRefused
                    | std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::ConnectionAborted
                    | std::io::ErrorKind::BrokenPipe
                    | std::io::ErrorKind::Interrupted
            ),
            // A well-formed business error will not change on re-request
            Error::Api { .. } => false,
            // No ID in the URL is terminal for that link
            Error::Classification { .. } => false,
            // Transfer errors already exhausted their own fallback chain
            Error::Transfer(_) => false,
            Error::Config { .. } => false,
            Error::Database(_) => false,
            Error::Serialization(_) => false,
            Error::Cancelled => false,
        }
    }
}

/// Execute an async operation with bounded retries and escalating delays.
///
/// Runs `operation` up to `config.max_retries` attempts total (a value of 0
/// is treated as 1). After a retryable failure, waits
/// `delays[min(attempt, delays.len() - 1)]` before the next attempt. The
/// last failure is returned to the caller once attempts are exhausted;
/// nothing is swallowed.
///
/// Operations must be safely re-invocable (the call sites here are
/// read-mostly GETs).
///
/// # Example
///
/// ```no_run
/// use douyin_dl::retry::execute_with_retry;
/// use douyin_dl::config::RetryConfig;
/// use douyin_dl::error::Error;
///
/// # async fn example() -> Result<(), Error> {
/// let config = RetryConfig::default();
/// let body = execute_with_retry(&config, || async {
///     Ok::<String, Error>("page".to_string())
/// })
/// .await?;
/// # Ok(())
/// # }
/// ```
pub async fn execute_with_retry<F, Fut, T, E>(config: &RetryConfig, mut operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: IsRetryable + std::fmt::Display,
{
    let max_attempts = config.max_retries.max(1);
    let mut attempt: u32 = 0;

    loop {
        match operation().await {
            Ok(result) => {
                if attempt > 0 {
                    tracing::info!(attempts = attempt + 1, "operation succeeded after retry");
                }
                return Ok(result);
            }
            Err(e) if e.is_retryable() && attempt + 1 < max_attempts => {
                let delay = retry_delay(config, attempt);
                tracing::warn!(
                    error = %e,
                    attempt = attempt + 1,
                    max_attempts,
                    delay_ms = delay.as_millis(),
                    "operation failed, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => {
                if e.is_retryable() {
                    tracing::error!(
                        error = %e,
                        attempts = attempt + 1,
                        "operation failed after all retry attempts exhausted"
                    );
                } else {
                    tracing::error!(error = %e, "operation failed with non-retryable error");
                }
                return Err(e);
            }
        }
    }
}

/// Delay before the retry following failed attempt number `attempt` (0-based)
fn retry_delay(config: &RetryConfig, attempt: u32) -> std::time::Duration {
    debug_assert!(!config.delays.is_empty(), "validated by Config::validate");
    let idx = (attempt as usize).min(config.delays.len().saturating_sub(1));
    config
        .delays
        .get(idx)
        .copied()
        .unwrap_or(std::time::Duration::from_secs(1))
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    #[derive(Debug)]
    enum TestError {
        Transient,
        Permanent,
    }

    impl std::fmt::Display for TestError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                TestError::Transient => write!(f, "transient error"),
                TestError::Permanent => write!(f, "permanent error"),
            }
        }
    }

    impl IsRetryable for TestError {
        fn is_retryable(&self) -> bool {
            matches!(self, TestError::Transient)
        }
    }

    fn quick_config(max_retries: u32) -> RetryConfig {
        RetryConfig {
            max_retries,
            delays: vec![
                Duration::from_millis(10),
                Duration::from_millis(20),
                Duration::from_millis(50),
            ],
        }
    }

    #[tokio::test]
    async fn success_does_not_retry() {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result = execute_with_retry(&quick_config(3), || {
            let counter = counter_clone.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok::<_, TestError>(42)
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(counter.load(Ordering::SeqCst), 1, "should only call once");
    }

    #[tokio::test]
    async fn transient_failures_retry_until_success() {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result = execute_with_retry(&quick_config(3), || {
            let counter = counter_clone.clone();
            async move {
                if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(TestError::Transient)
                } else {
                    Ok(42)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(
            counter.load(Ordering::SeqCst),
            3,
            "should retry twice before success"
        );
    }

    #[tokio::test]
    async fn exhaustion_returns_the_last_error() {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result = execute_with_retry(&quick_config(3), || {
            let counter = counter_clone.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err::<i32, _>(TestError::Transient)
            }
        })
        .await;

        assert!(matches!(result, Err(TestError::Transient)));
        assert_eq!(
            counter.load(Ordering::SeqCst),
            3,
            "max_retries is the total attempt budget"
        );
    }

    #[tokio::test]
    async fn permanent_errors_are_not_retried() {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result = execute_with_retry(&quick_config(3), || {
            let counter = counter_clone.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err::<i32, _>(TestError::Permanent)
            }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn zero_max_retries_still_runs_once() {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result = execute_with_retry(&quick_config(0), || {
            let counter = counter_clone.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err::<i32, _>(TestError::Transient)
            }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn delay_schedule_escalates_and_clamps_to_last_entry() {
        let config = RetryConfig {
            max_retries: 5,
            delays: vec![Duration::from_secs(1), Duration::from_secs(2), Duration::from_secs(5)],
        };

        let start = tokio::time::Instant::now();
        let _result = execute_with_retry(&config, || async { Err::<i32, _>(TestError::Transient) })
            .await;

        // 4 waits: 1s + 2s + 5s + 5s (last entry repeats)
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(13), "waited {elapsed:?}");
        assert!(elapsed < Duration::from_secs(14), "waited {elapsed:?}");
    }

    #[test]
    fn retry_delay_clamps_index() {
        let config = RetryConfig {
            max_retries: 10,
            delays: vec![Duration::from_secs(1), Duration::from_secs(2)],
        };
        assert_eq!(retry_delay(&config, 0), Duration::from_secs(1));
        assert_eq!(retry_delay(&config, 1), Duration::from_secs(2));
        assert_eq!(retry_delay(&config, 7), Duration::from_secs(2));
    }

    #[test]
    fn network_and_response_errors_are_retryable() {
        let err = Error::UnexpectedResponse {
            status: Some(502),
            message: "bad gateway".to_string(),
        };
        assert!(err.is_retryable());

        let timeout = Error::Io(std::io::Error::new(std::io::ErrorKind::TimedOut, "timeout"));
        assert!(timeout.is_retryable());
    }

    #[test]
    fn business_and_local_errors_are_not_retryable() {
        assert!(
            !Error::Api {
                code: 2190,
                message: "verify needed".to_string()
            }
            .is_retryable()
        );
        assert!(
            !Error::Classification {
                url: "https://example.com".to_string()
            }
            .is_retryable()
        );
        assert!(
            !Error::Transfer(crate::error::TransferError::NoPlayableSource {
                id: "1".to_string()
            })
            .is_retryable()
        );
        assert!(!Error::Cancelled.is_retryable());
        let not_found = Error::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "missing"));
        assert!(!not_found.is_retryable());
    }
}
