// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Retry logic with exponential backoff.
//!
//! Retry is a decorator around an async operation: the operation is re-invoked
//! until it succeeds, the error is classified as non-retryable, or the attempt
//! ceiling is reached. [`retry_or_else`] adds a fallback that can turn the
//! final error into a value (the degrade-to-empty policy of the fetcher).
//!
//! # Example
//!
//! ```
//! use holiday_sync::RetryConfig;
//! use std::time::Duration;
//!
//! // Upstream provider calls: 3 attempts, 1s then 2s between them
//! let upstream = RetryConfig::upstream();
//! assert_eq!(upstream.max_attempts, Some(3));
//! assert_eq!(upstream.delay_before_attempt(2), Duration::from_secs(1));
//! assert_eq!(upstream.delay_before_attempt(3), Duration::from_secs(2));
//!
//! // Startup: fail fast on bad config
//! let startup = RetryConfig::startup();
//! assert_eq!(startup.max_attempts, Some(5));
//! ```

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

/// Configuration for operation retry behavior.
///
/// Use the preset constructors for common patterns:
/// - [`RetryConfig::upstream()`] - External provider calls
/// - [`RetryConfig::startup()`] - Fast-fail for initial connections
/// - [`RetryConfig::query()`] - Quick retry for individual store operations
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Delay after the first failed attempt
    pub initial_delay: Duration,
    /// Upper bound for any single delay
    pub max_delay: Duration,
    /// Multiplier applied to the delay after each failed attempt
    pub factor: f64,
    /// Total attempts (first call included); `None` retries forever
    pub max_attempts: Option<usize>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::upstream()
    }
}

impl RetryConfig {
    /// Provider calls: 3 attempts, base delay 1s, doubling.
    #[must_use]
    pub fn upstream() -> Self {
        Self {
            max_attempts: Some(3),
            initial_delay: Duration::from_millis(1000),
            max_delay: Duration::from_secs(30),
            factor: 2.0,
        }
    }

    /// Fast-fail retry for initial startup connection.
    /// Attempts 5 times with exponential backoff, failing after ~3 seconds.
    #[must_use]
    pub fn startup() -> Self {
        Self {
            max_attempts: Some(5),
            initial_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(2),
            factor: 2.0,
        }
    }

    /// Quick retry for individual queries (don't block forever).
    #[must_use]
    pub fn query() -> Self {
        Self {
            max_attempts: Some(3),
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(2),
            factor: 2.0,
        }
    }

    /// Fast retry for tests (minimal delays)
    #[cfg(test)]
    pub fn test() -> Self {
        Self {
            max_attempts: Some(3),
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(10),
            factor: 2.0,
        }
    }

    /// Delay slept before `attempt` (1-based). The first attempt is immediate.
    ///
    /// Growth that overflows `Duration` (or a non-finite factor) saturates at
    /// `max_delay`.
    #[must_use]
    pub fn delay_before_attempt(&self, attempt: usize) -> Duration {
        if attempt <= 1 {
            return Duration::ZERO;
        }
        let mut delay = self.initial_delay.min(self.max_delay);
        for _ in 2..attempt {
            delay = Duration::try_from_secs_f64(delay.as_secs_f64() * self.factor)
                .map_or(self.max_delay, |next| next.min(self.max_delay));
            if delay == self.max_delay {
                break;
            }
        }
        delay
    }
}

/// Retry `operation` on every error.
pub async fn retry<F, Fut, T, E>(
    operation_name: &str,
    config: &RetryConfig,
    operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    retry_if(operation_name, config, operation, |_| true).await
}

/// Retry `operation` while `should_retry` classifies the error as transient.
///
/// A non-retryable error is returned immediately; a retryable one is returned
/// once the attempt ceiling is reached.
pub async fn retry_if<F, Fut, T, E, P>(
    operation_name: &str,
    config: &RetryConfig,
    mut operation: F,
    should_retry: P,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
    P: Fn(&E) -> bool,
{
    let mut attempts = 0usize;

    loop {
        match operation().await {
            Ok(val) => {
                if attempts > 0 {
                    info!("Operation '{}' succeeded after {} retries", operation_name, attempts);
                }
                return Ok(val);
            }
            Err(err) => {
                attempts += 1;

                if !should_retry(&err) {
                    return Err(err);
                }
                if let Some(max) = config.max_attempts {
                    if attempts >= max {
                        return Err(err);
                    }
                }

                let delay = config.delay_before_attempt(attempts + 1);
                match config.max_attempts {
                    Some(max) => warn!(
                        "Operation '{}' failed (attempt {}/{}): {}. Retrying in {:?}...",
                        operation_name, attempts, max, err, delay
                    ),
                    None => warn!(
                        "Operation '{}' failed (attempt {}, will retry forever): {}. Next retry in {:?}...",
                        operation_name, attempts, err, delay
                    ),
                }
                crate::metrics::record_retry(operation_name);

                sleep(delay).await;
            }
        }
    }
}

/// [`retry_if`], then hand the final error to `fallback`.
///
/// `fallback` decides whether the failure is absorbed (return `Ok`) or
/// propagated (return `Err`).
pub async fn retry_or_else<F, Fut, T, E, P, R>(
    operation_name: &str,
    config: &RetryConfig,
    operation: F,
    should_retry: P,
    fallback: R,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
    P: Fn(&E) -> bool,
    R: FnOnce(E) -> Result<T, E>,
{
    match retry_if(operation_name, config, operation, should_retry).await {
        Ok(val) => Ok(val),
        Err(err) => fallback(err),
    }
}
