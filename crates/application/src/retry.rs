//! Generic retry logic with exponential backoff
//!
//! Used by the [`crate::services::bridge::Bridge`] to retry transport
//! failures without retrying protocol or routing errors.
//!
//! # Example
//!
//! ```rust,ignore
//! use application::retry::{RetryConfig, with_retry};
//!
//! let config = RetryConfig::default();
//! let result = with_retry(&config, || async {
//!     client.send_text(&target, "hi").await
//! }).await;
//! ```

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Configuration for retry behavior with exponential backoff
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Initial delay before first retry in milliseconds (default: 100ms)
    #[serde(default = "default_initial_delay")]
    pub initial_delay_ms: u64,

    /// Maximum delay between retries in milliseconds (default: 10000ms = 10s)
    #[serde(default = "default_max_delay")]
    pub max_delay_ms: u64,

    /// Multiplier for exponential backoff (default: 2.0)
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,

    /// Maximum number of attempts, including the first (default: 3)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Whether to add jitter to prevent thundering herd (default: true)
    #[serde(default = "default_true")]
    pub jitter_enabled: bool,

    /// Maximum jitter factor (0.0 to 1.0, default: 0.1 = 10%)
    #[serde(default = "default_jitter_factor")]
    pub jitter_factor: f64,
}

const fn default_initial_delay() -> u64 {
    100
}

const fn default_max_delay() -> u64 {
    10_000
}

const fn default_multiplier() -> f64 {
    2.0
}

const fn default_max_attempts() -> u32 {
    3
}

const fn default_true() -> bool {
    true
}

const fn default_jitter_factor() -> f64 {
    0.1
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: default_initial_delay(),
            max_delay_ms: default_max_delay(),
            multiplier: default_multiplier(),
            max_attempts: default_max_attempts(),
            jitter_enabled: default_true(),
            jitter_factor: default_jitter_factor(),
        }
    }
}

impl RetryConfig {
    /// Create a new retry configuration with custom parameters
    #[must_use]
    pub const fn new(initial_delay_ms: u64, max_delay_ms: u64, multiplier: f64, max_attempts: u32) -> Self {
        Self {
            initial_delay_ms,
            max_delay_ms,
            multiplier,
            max_attempts,
            jitter_enabled: true,
            jitter_factor: 0.1,
        }
    }

    /// Calculate the delay for a given attempt number (0-indexed)
    ///
    /// Uses exponential backoff: delay = initial_delay * multiplier^attempt,
    /// capped at max_delay, with optional jitter to prevent thundering herd.
    #[must_use]
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_wrap,
        clippy::cast_sign_loss,
        clippy::cast_possible_truncation
    )]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let base_delay = (self.initial_delay_ms as f64) * self.multiplier.powi(attempt as i32);
        let capped_delay = base_delay.min(self.max_delay_ms as f64);

        let final_delay = if self.jitter_enabled {
            let jitter_range = capped_delay * self.jitter_factor;
            let jitter = rand::thread_rng().gen_range(-jitter_range..=jitter_range);
            (capped_delay + jitter).max(0.0)
        } else {
            capped_delay
        };

        Duration::from_millis(final_delay as u64)
    }
}

/// Trait for errors that can be checked for retryability
pub trait Retryable {
    /// Returns true if this error is retryable
    fn is_retryable(&self) -> bool;
}

impl Retryable for crate::WhatSignalError {
    fn is_retryable(&self) -> bool {
        Self::is_retryable(self)
    }
}

/// Retry result containing either success or the last error
#[derive(Debug)]
pub struct RetryResult<T, E> {
    /// The result of the operation
    pub result: Result<T, E>,
    /// Number of attempts made (1 = no retries, 2 = one retry, etc.)
    pub attempts: u32,
    /// Total time spent including retries
    pub total_duration: Duration,
}

impl<T, E> RetryResult<T, E> {
    /// Check if the operation succeeded
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.result.is_ok()
    }

    /// Check if the operation failed
    #[must_use]
    pub const fn is_err(&self) -> bool {
        self.result.is_err()
    }

    /// Convert to standard Result, discarding metadata
    pub fn into_result(self) -> Result<T, E> {
        self.result
    }
}

/// Execute an async operation with retry logic
///
/// Retries the operation according to the configuration when it fails
/// with a retryable error.
#[allow(clippy::cast_possible_truncation)]
pub async fn with_retry<F, Fut, T, E>(config: &RetryConfig, mut operation: F) -> RetryResult<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Retryable + std::fmt::Display,
{
    let start = std::time::Instant::now();
    let mut attempts = 0u32;

    loop {
        attempts += 1;
        let result = operation().await;

        match result {
            Ok(value) => {
                if attempts > 1 {
                    debug!(
                        attempts = attempts,
                        duration_ms = start.elapsed().as_millis() as u64,
                        "operation succeeded after retries"
                    );
                }
                return RetryResult {
                    result: Ok(value),
                    attempts,
                    total_duration: start.elapsed(),
                };
            }
            Err(err) => {
                let retry_attempt = attempts - 1;

                if !err.is_retryable() {
                    debug!(attempts = attempts, error = %err, "operation failed with non-retryable error");
                    return RetryResult {
                        result: Err(err),
                        attempts,
                        total_duration: start.elapsed(),
                    };
                }

                if attempts >= config.max_attempts {
                    warn!(
                        attempts = attempts,
                        max_attempts = config.max_attempts,
                        error = %err,
                        "operation failed after max attempts"
                    );
                    return RetryResult {
                        result: Err(err),
                        attempts,
                        total_duration: start.elapsed(),
                    };
                }

                let delay = config.delay_for_attempt(retry_attempt);
                warn!(
                    attempt = attempts,
                    max_attempts = config.max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "operation failed, retrying"
                );

                tokio::time::sleep(delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;
    use crate::WhatSignalError;

    #[test]
    fn delay_for_attempt_grows_exponentially_without_jitter() {
        let config = RetryConfig::new(100, 10_000, 2.0, 5).without_jitter_for_test();
        assert_eq!(config.delay_for_attempt(0), Duration::from_millis(100));
        assert_eq!(config.delay_for_attempt(1), Duration::from_millis(200));
        assert_eq!(config.delay_for_attempt(2), Duration::from_millis(400));
    }

    #[test]
    fn delay_for_attempt_caps_at_max_delay() {
        let config = RetryConfig::new(100, 300, 2.0, 10).without_jitter_for_test();
        assert_eq!(config.delay_for_attempt(10), Duration::from_millis(300));
    }

    impl RetryConfig {
        fn without_jitter_for_test(mut self) -> Self {
            self.jitter_enabled = false;
            self
        }
    }

    #[tokio::test]
    async fn with_retry_succeeds_without_retry_on_first_try() {
        let config = RetryConfig::default();
        let result: RetryResult<i32, WhatSignalError> =
            with_retry(&config, || async { Ok(42) }).await;
        assert_eq!(result.attempts, 1);
        assert_eq!(result.into_result().unwrap(), 42);
    }

    #[tokio::test]
    async fn with_retry_stops_immediately_on_non_retryable_error() {
        let config = RetryConfig::default();
        let calls = AtomicU32::new(0);
        let result: RetryResult<i32, WhatSignalError> = with_retry(&config, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(WhatSignalError::Protocol("bad request".into())) }
        })
        .await;
        assert_eq!(result.attempts, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn with_retry_retries_transport_errors_up_to_max_attempts() {
        let config = RetryConfig::new(1, 5, 1.0, 3).without_jitter_for_test();
        let calls = AtomicU32::new(0);
        let result: RetryResult<i32, WhatSignalError> = with_retry(&config, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(WhatSignalError::Transport("timeout".into())) }
        })
        .await;
        assert_eq!(result.attempts, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn with_retry_succeeds_after_transient_failure() {
        let config = RetryConfig::new(1, 5, 1.0, 5).without_jitter_for_test();
        let calls = AtomicU32::new(0);
        let result: RetryResult<i32, WhatSignalError> = with_retry(&config, || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(WhatSignalError::Transport("timeout".into()))
                } else {
                    Ok(7)
                }
            }
        })
        .await;
        assert_eq!(result.attempts, 3);
        assert_eq!(result.into_result().unwrap(), 7);
    }
}
