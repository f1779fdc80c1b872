//! Tests for retry termination and terminal-error short-circuiting.

use billfold_error::{RemoteError, RemoteErrorKind, RetryableError};
use billfold_retry::{RetryConfig, RetryPolicy};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

fn fast_policy(max_attempts: usize) -> RetryPolicy {
    RetryPolicy::builder()
        .max_attempts(max_attempts)
        .initial_backoff(Duration::from_millis(1))
        .max_backoff(Duration::from_millis(1))
        .build()
}

fn connection_error() -> RemoteError {
    RemoteError::new(RemoteErrorKind::Connection("connection reset".to_string()))
}

#[tokio::test]
async fn test_retryable_error_exhausts_ten_attempts() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();

    let result: Result<(), RemoteError> = fast_policy(10)
        .execute(|| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(connection_error())
            }
        })
        .await;

    assert_eq!(calls.load(Ordering::SeqCst), 10);
    let err = result.unwrap_err();
    assert!(matches!(err.kind, RemoteErrorKind::Connection(_)));
}

#[tokio::test]
async fn test_terminal_error_is_not_retried() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();

    let result: Result<(), RemoteError> = fast_policy(10)
        .execute(|| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(RemoteError::new(RemoteErrorKind::Authentication(
                    "Invalid API Key provided".to_string(),
                )))
            }
        })
        .await;

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    let err = result.unwrap_err();
    assert!(!err.is_retryable());
    assert!(matches!(err.kind, RemoteErrorKind::Authentication(_)));
}

#[tokio::test]
async fn test_success_after_transient_failures() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();

    let result = fast_policy(10)
        .execute(|| {
            let counter = counter.clone();
            async move {
                let attempt = counter.fetch_add(1, Ordering::SeqCst) + 1;
                if attempt < 3 {
                    Err(RemoteError::new(RemoteErrorKind::Api {
                        status_code: 503,
                        message: "Service unavailable".to_string(),
                    }))
                } else {
                    Ok(attempt)
                }
            }
        })
        .await;

    assert_eq!(result.unwrap(), 3);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_last_error_is_returned_unchanged() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();

    let result: Result<(), RemoteError> = fast_policy(4)
        .execute(|| {
            let counter = counter.clone();
            async move {
                let attempt = counter.fetch_add(1, Ordering::SeqCst) + 1;
                Err(RemoteError::new(RemoteErrorKind::RateLimited(format!(
                    "attempt {}",
                    attempt
                ))))
            }
        })
        .await;

    let err = result.unwrap_err();
    assert_eq!(
        err.kind,
        RemoteErrorKind::RateLimited("attempt 4".to_string())
    );
}

#[tokio::test]
async fn test_single_attempt_policy() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();

    let result: Result<(), RemoteError> = fast_policy(1)
        .execute(|| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(connection_error())
            }
        })
        .await;

    assert!(result.is_err());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_predicate_narrows_retried_errors() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();

    let result: Result<(), RemoteError> = fast_policy(5)
        .execute_when(
            || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(RemoteError::new(RemoteErrorKind::Api {
                        status_code: 503,
                        message: "Service unavailable".to_string(),
                    }))
                }
            },
            |e: &RemoteError| matches!(e.kind, RemoteErrorKind::Connection(_)),
        )
        .await;

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(result.unwrap_err().is_retryable());

    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let result: Result<(), RemoteError> = fast_policy(5)
        .execute_when(
            || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(connection_error())
                }
            },
            |e: &RemoteError| matches!(e.kind, RemoteErrorKind::Connection(_)),
        )
        .await;

    assert!(result.is_err());
    assert_eq!(calls.load(Ordering::SeqCst), 5);
}

#[test]
fn test_config_defaults_match_policy_defaults() {
    let config: RetryConfig = serde_json::from_str("{}").unwrap();
    assert_eq!(config, RetryConfig::default());
    assert_eq!(config.policy(), RetryPolicy::default());
}

#[test]
fn test_config_validation() {
    let config = RetryConfig {
        max_attempts: 0,
        ..RetryConfig::default()
    };
    assert!(config.validate().is_err());

    let config = RetryConfig {
        initial_backoff_ms: 5_000,
        max_backoff_ms: 1_000,
        ..RetryConfig::default()
    };
    assert!(config.validate().is_err());

    assert!(RetryConfig::default().validate().is_ok());
}

#[test]
fn test_config_rejects_unknown_fields() {
    let parsed: Result<RetryConfig, _> = serde_json::from_str(r#"{"attempts": 3}"#);
    assert!(parsed.is_err());
}
