//! Tests for the retry module

use super::*;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use tokio_test::{assert_err, assert_ok};

#[derive(Debug, Clone)]
struct HttpFailure(u16);

impl std::fmt::Display for HttpFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "HTTP {}", self.0)
    }
}

impl RetryClassify for HttpFailure {
    fn status_code(&self) -> Option<u16> {
        Some(self.0)
    }
}

#[derive(Default)]
struct RecordingObserver {
    delays: Mutex<Vec<Duration>>,
    attempts: AtomicU32,
}

impl RetryObserver for RecordingObserver {
    fn on_attempt(&self, _attempt: u32, _max_attempts: u32) {
        self.attempts.fetch_add(1, Ordering::SeqCst);
    }

    fn on_failure(&self, _attempt: u32, _error: &str, _retryable: bool, next_delay: Option<Duration>) {
        if let Some(delay) = next_delay {
            self.delays.lock().unwrap().push(delay);
        }
    }
}

#[test]
fn test_retry_policy_defaults() {
    let policy = RetryPolicy::default();
    assert_eq!(policy.max_retries, 3);
    assert_eq!(policy.max_attempts(), 4);
    assert_eq!(policy.initial_delay_ms, 1_000);
    assert_eq!(policy.max_delay_ms, 10_000);
    assert_eq!(policy.backoff_multiplier, 2.0);
    assert_eq!(policy.retryable_status_codes, vec![408, 429, 500, 502, 503, 504]);
    assert!(policy.validate().is_ok());
}

#[test]
fn test_retry_policy_builder() {
    let policy = RetryPolicy::new()
        .with_max_retries(5)
        .with_initial_delay(Duration::from_millis(200))
        .with_max_delay(Duration::from_secs(30))
        .with_backoff_multiplier(3.0)
        .with_error_pattern("Target closed")
        .with_jitter(false);

    assert_eq!(policy.max_retries, 5);
    assert_eq!(policy.initial_delay_ms, 200);
    assert_eq!(policy.max_delay_ms, 30_000);
    assert_eq!(policy.backoff_multiplier, 3.0);
    assert_eq!(policy.retryable_error_patterns, vec!["Target closed".to_string()]);
    assert!(!policy.jitter);
}

#[test]
fn test_partial_override_from_json() {
    let policy: RetryPolicy =
        serde_json::from_value(serde_json::json!({"maxRetries": 1, "initialDelayMs": 50})).unwrap();
    assert_eq!(policy.max_retries, 1);
    assert_eq!(policy.initial_delay_ms, 50);
    assert_eq!(policy.max_delay_ms, 10_000);
}

#[test]
fn test_validate_rejects_bad_values() {
    assert!(RetryPolicy::new().with_backoff_multiplier(0.5).validate().is_err());
    assert!(RetryPolicy::new()
        .with_initial_delay(Duration::from_secs(20))
        .validate()
        .is_err());
}

#[test]
fn test_validate_rejects_values_past_ceilings() {
    assert_ok!(RetryPolicy::new()
        .with_max_retries(MAX_RETRIES_LIMIT)
        .validate());
    assert_err!(RetryPolicy::new()
        .with_max_retries(MAX_RETRIES_LIMIT + 1)
        .validate());

    let huge: RetryPolicy = serde_json::from_value(serde_json::json!({
        "initialDelayMs": u64::MAX,
        "maxDelayMs": u64::MAX
    }))
    .unwrap();
    assert_err!(huge.validate());
}

#[test]
fn test_delay_saturates_instead_of_overflowing() {
    let huge = RetryPolicy {
        initial_delay_ms: u64::MAX,
        max_delay_ms: u64::MAX,
        ..RetryPolicy::default()
    };

    for attempt in 2..5 {
        assert!(huge.delay_before_attempt(attempt) >= Duration::from_millis(u64::MAX / 2));
    }
}

#[test]
fn test_delay_before_attempt() {
    let policy = RetryPolicy::new()
        .with_initial_delay(Duration::from_millis(100))
        .with_backoff_multiplier(2.0)
        .with_jitter(false);

    assert_eq!(policy.delay_before_attempt(1), Duration::ZERO);
    assert_eq!(policy.delay_before_attempt(2), Duration::from_millis(100));
    assert_eq!(policy.delay_before_attempt(3), Duration::from_millis(200));
    assert_eq!(policy.delay_before_attempt(4), Duration::from_millis(400));
}

#[test]
fn test_delay_respects_max() {
    let policy = RetryPolicy::new()
        .with_initial_delay(Duration::from_secs(1))
        .with_max_delay(Duration::from_secs(5))
        .with_backoff_multiplier(10.0)
        .with_jitter(false);

    // 1 * 10^2 = 100 seconds, capped at 5
    assert_eq!(policy.delay_before_attempt(4), Duration::from_secs(5));
}

#[test]
fn test_jitter_stays_within_ten_percent() {
    let policy = RetryPolicy::new();
    for _ in 0..50 {
        let delay = policy.delay_before_attempt(2);
        assert!(delay >= Duration::from_millis(1_000));
        assert!(delay <= Duration::from_millis(1_100));
    }
}

#[test]
fn test_is_retryable() {
    let policy = RetryPolicy::new();
    assert!(policy.is_retryable(&HttpFailure(503)));
    assert!(policy.is_retryable(&HttpFailure(429)));
    assert!(!policy.is_retryable(&HttpFailure(404)));
    assert!(policy.is_retryable(&"net::ERR_NAME_NOT_RESOLVED"));
    assert!(policy.is_retryable(&"socket hang up"));
    assert!(policy.is_retryable(&"Navigation timeout of 30000 ms exceeded"));
    assert!(!policy.is_retryable(&"Cannot read properties of undefined"));

    let custom = RetryPolicy::new().with_error_pattern("target closed");
    assert!(custom.is_retryable(&"Protocol error: Target closed."));
}

#[tokio::test]
async fn test_retry_success_first_attempt() {
    let policy = RetryPolicy::new();
    let counter = Arc::new(AtomicU32::new(0));
    let counter_clone = counter.clone();

    let result = with_retry(&policy, &TracingRetryObserver, || {
        let c = counter_clone.clone();
        async move {
            c.fetch_add(1, Ordering::SeqCst);
            Ok::<i32, HttpFailure>(42)
        }
    })
    .await;

    let retried = result.unwrap();
    assert_eq!(retried.value, 42);
    assert_eq!(retried.retry_attempts, 0);
    assert_eq!(counter.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_retry_success_after_503() {
    let policy = RetryPolicy::new().with_jitter(false);
    let counter = Arc::new(AtomicU32::new(0));
    let counter_clone = counter.clone();
    let started = tokio::time::Instant::now();

    let result = with_retry(&policy, &TracingRetryObserver, || {
        let c = counter_clone.clone();
        async move {
            if c.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(HttpFailure(503))
            } else {
                Ok("loaded")
            }
        }
    })
    .await;

    let retried = result.unwrap();
    assert_eq!(retried.value, "loaded");
    assert_eq!(retried.retry_attempts, 1);
    assert_eq!(counter.load(Ordering::SeqCst), 2);
    assert!(started.elapsed() >= Duration::from_millis(1_000));
}

#[tokio::test(start_paused = true)]
async fn test_retry_all_attempts_fail() {
    let policy = RetryPolicy::new().with_max_retries(2);
    let observer = RecordingObserver::default();

    let result: std::result::Result<Retried<()>, RetryError<HttpFailure>> =
        with_retry(&policy, &observer, || async { Err(HttpFailure(502)) }).await;

    let err = result.unwrap_err();
    assert_eq!(err.attempts, 3);
    assert_eq!(err.retry_attempts(), 2);
    assert!(err.retryable);
    assert_eq!(err.last_error.0, 502);
    assert_eq!(observer.attempts.load(Ordering::SeqCst), 3);
    assert_eq!(err.to_string(), "Operation failed after 3 attempts: HTTP 502");
}

#[tokio::test]
async fn test_non_retryable_error_propagates_immediately() {
    let policy = RetryPolicy::new();
    let counter = Arc::new(AtomicU32::new(0));
    let counter_clone = counter.clone();

    let result: std::result::Result<Retried<()>, RetryError<HttpFailure>> =
        with_retry(&policy, &TracingRetryObserver, || {
            let c = counter_clone.clone();
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err(HttpFailure(404))
            }
        })
        .await;

    let err = result.unwrap_err();
    assert_eq!(err.attempts, 1);
    assert!(!err.retryable);
    assert_eq!(counter.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_total_delay_is_bounded() {
    for (retries, initial, max, multiplier) in [
        (3, 1_000, 10_000, 2.0),
        (5, 500, 2_000, 3.0),
        (4, 100, 100, 1.0),
        (0, 1_000, 10_000, 2.0),
    ] {
        let policy = RetryPolicy {
            max_retries: retries,
            initial_delay_ms: initial,
            max_delay_ms: max,
            backoff_multiplier: multiplier,
            ..RetryPolicy::default()
        };
        let observer = RecordingObserver::default();

        let _ = with_retry(&policy, &observer, || async { Err::<(), _>("ECONNRESET") }).await;

        let delays = observer.delays.lock().unwrap().clone();
        assert_eq!(delays.len(), retries as usize);
        let total: Duration = delays.iter().sum();
        let bound = Duration::from_millis(u64::from(retries) * max + u64::from(retries) * max / 10);
        assert!(total <= bound, "{total:?} > {bound:?}");
        assert_eq!(observer.attempts.load(Ordering::SeqCst), retries + 1);
    }
}
