//! Retry logic with exponential backoff
//!
//! Wraps the navigation phase of a capture. Failures are classified as
//! retryable (listed HTTP status, transient network message, or a
//! caller-supplied pattern) or fatal; fatal errors and the last attempt
//! propagate immediately.

use crate::error::{Error, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

#[cfg(test)]
mod tests;

/// Message fragments that indicate a transient network failure
const TRANSIENT_PATTERNS: &[&str] = &[
    "timeout",
    "timed out",
    "etimedout",
    "enotfound",
    "eai_again",
    "getaddrinfo",
    "dns",
    "econnreset",
    "connection reset",
    "econnrefused",
    "connection refused",
    "socket hang up",
    "net::err_",
];

/// Largest accepted `max_retries`
pub const MAX_RETRIES_LIMIT: u32 = 10;
/// Largest accepted single delay (5 minutes)
pub const MAX_DELAY_LIMIT_MS: u64 = 300_000;

/// Retry configuration for one request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Delay before the first retry
    pub initial_delay_ms: u64,
    /// Upper bound for a single delay (before jitter)
    pub max_delay_ms: u64,
    /// Multiplier for exponential backoff (>= 1)
    pub backoff_multiplier: f64,
    /// HTTP status codes worth retrying
    pub retryable_status_codes: Vec<u16>,
    /// Extra message fragments worth retrying (case-insensitive)
    pub retryable_error_patterns: Vec<String>,
    /// Add up to 10% random jitter to each delay
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay_ms: 1_000,
            max_delay_ms: 10_000,
            backoff_multiplier: 2.0,
            retryable_status_codes: vec![408, 429, 500, 502, 503, 504],
            retryable_error_patterns: Vec::new(),
            jitter: true,
        }
    }
}

impl RetryPolicy {
    /// Create a policy with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A policy that never retries
    #[must_use]
    pub fn none() -> Self {
        Self::default().with_max_retries(0)
    }

    /// Set maximum retries
    #[must_use]
    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Set initial delay
    #[must_use]
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay_ms = delay.as_millis() as u64;
        self
    }

    /// Set maximum delay
    #[must_use]
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay_ms = delay.as_millis() as u64;
        self
    }

    /// Set backoff multiplier
    #[must_use]
    pub fn with_backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    /// Add a retryable message pattern
    #[must_use]
    pub fn with_error_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.retryable_error_patterns.push(pattern.into());
        self
    }

    /// Enable or disable jitter
    #[must_use]
    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Total attempts allowed
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Check the policy for impossible values
    pub fn validate(&self) -> Result<()> {
        if !(self.backoff_multiplier >= 1.0) {
            return Err(Error::Config(format!(
                "backoff multiplier must be >= 1, got {}",
                self.backoff_multiplier
            )));
        }
        if self.max_retries > MAX_RETRIES_LIMIT {
            return Err(Error::Config(format!(
                "max retries must be <= {MAX_RETRIES_LIMIT}, got {}",
                self.max_retries
            )));
        }
        if self.max_delay_ms > MAX_DELAY_LIMIT_MS {
            return Err(Error::Config(format!(
                "max delay must be <= {MAX_DELAY_LIMIT_MS}ms, got {}ms",
                self.max_delay_ms
            )));
        }
        if self.max_delay_ms < self.initial_delay_ms {
            return Err(Error::Config(format!(
                "max delay ({}ms) is below initial delay ({}ms)",
                self.max_delay_ms, self.initial_delay_ms
            )));
        }
        Ok(())
    }

    /// Delay before the given attempt (attempt 1 has none).
    ///
    /// `min(initial * multiplier^(attempt - 2), max)` plus up to 10% jitter.
    #[must_use]
    pub fn delay_before_attempt(&self, attempt: u32) -> Duration {
        if attempt < 2 {
            return Duration::ZERO;
        }
        let exponent = i32::try_from(attempt - 2).unwrap_or(i32::MAX);
        let base = self.initial_delay_ms as f64 * self.backoff_multiplier.max(1.0).powi(exponent);
        let delay_ms = base.min(self.max_delay_ms as f64) as u64;

        let jitter_ms = if self.jitter && delay_ms >= 10 {
            rand::thread_rng().gen_range(0..=delay_ms / 10)
        } else {
            0
        };
        Duration::from_millis(delay_ms.saturating_add(jitter_ms))
    }

    /// Whether an error should trigger another attempt
    #[must_use]
    pub fn is_retryable<E: RetryClassify + std::fmt::Display + ?Sized>(&self, error: &E) -> bool {
        if let Some(status) = error.status_code() {
            if self.retryable_status_codes.contains(&status) {
                return true;
            }
        }
        let message = error.to_string().to_lowercase();
        TRANSIENT_PATTERNS.iter().any(|p| message.contains(*p))
            || self
                .retryable_error_patterns
                .iter()
                .any(|p| !p.is_empty() && message.contains(&p.to_lowercase()))
    }
}

/// Errors that may carry an HTTP status
pub trait RetryClassify {
    /// HTTP status associated with the failure
    fn status_code(&self) -> Option<u16> {
        None
    }
}

impl RetryClassify for String {}
impl RetryClassify for &str {}

/// Receives every attempt and outcome of a retried operation
pub trait RetryObserver: Send + Sync {
    /// An attempt is about to start
    fn on_attempt(&self, _attempt: u32, _max_attempts: u32) {}

    /// An attempt failed; `next_delay` is set when another attempt follows
    fn on_failure(
        &self,
        _attempt: u32,
        _error: &str,
        _retryable: bool,
        _next_delay: Option<Duration>,
    ) {
    }

    /// An attempt succeeded
    fn on_success(&self, _attempt: u32) {}
}

/// Observer that only logs
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingRetryObserver;

impl RetryObserver for TracingRetryObserver {
    fn on_failure(&self, attempt: u32, error: &str, retryable: bool, next_delay: Option<Duration>) {
        match next_delay {
            Some(delay) => warn!(
                attempt = attempt,
                delay_ms = delay.as_millis() as u64,
                error = error,
                "Operation failed, retrying"
            ),
            None => debug!(
                attempt = attempt,
                retryable = retryable,
                error = error,
                "Operation failed, no more retries"
            ),
        }
    }

    fn on_success(&self, attempt: u32) {
        if attempt > 1 {
            debug!(attempt = attempt, "Operation succeeded after retry");
        }
    }
}

/// A successful result and how many retries it took
#[derive(Debug, Clone, PartialEq)]
pub struct Retried<T> {
    /// The operation's result
    pub value: T,
    /// Attempts beyond the first
    pub retry_attempts: u32,
}

/// Error type for retry operations
#[derive(Debug)]
pub struct RetryError<E> {
    /// The last error encountered
    pub last_error: E,
    /// Total number of attempts made
    pub attempts: u32,
    /// Whether the last error was classified as retryable
    pub retryable: bool,
}

impl<E> RetryError<E> {
    /// Attempts beyond the first
    #[must_use]
    pub fn retry_attempts(&self) -> u32 {
        self.attempts.saturating_sub(1)
    }
}

impl<E: std::fmt::Display> std::fmt::Display for RetryError<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Operation failed after {} attempts: {}",
            self.attempts, self.last_error
        )
    }
}

impl<E: std::fmt::Debug + std::fmt::Display> std::error::Error for RetryError<E> {}

/// Execute an async operation with retry logic
///
/// # Example
/// ```ignore
/// let policy = RetryPolicy::default();
/// let navigated = with_retry(&policy, &TracingRetryObserver, || async {
///     backend.navigate(url, &options).await
/// })
/// .await?;
/// ```
pub async fn with_retry<T, E, F, Fut>(
    policy: &RetryPolicy,
    observer: &dyn RetryObserver,
    mut operation: F,
) -> std::result::Result<Retried<T>, RetryError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::result::Result<T, E>>,
    E: RetryClassify + std::fmt::Display,
{
    let max_attempts = policy.max_attempts();
    let mut attempt = 1;

    loop {
        observer.on_attempt(attempt, max_attempts);
        match operation().await {
            Ok(value) => {
                observer.on_success(attempt);
                return Ok(Retried {
                    value,
                    retry_attempts: attempt - 1,
                });
            }
            Err(e) => {
                let message = e.to_string();
                let retryable = policy.is_retryable(&e);

                if retryable && attempt < max_attempts {
                    let delay = policy.delay_before_attempt(attempt + 1);
                    observer.on_failure(attempt, &message, true, Some(delay));
                    sleep(delay).await;
                    attempt += 1;
                } else {
                    observer.on_failure(attempt, &message, retryable, None);
                    return Err(RetryError {
                        last_error: e,
                        attempts: attempt,
                        retryable,
                    });
                }
            }
        }
    }
}
