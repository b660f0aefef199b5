// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Metrics instrumentation for the holiday sync engine.
//!
//! Uses the `metrics` crate for backend-agnostic metrics collection.
//! The host application is responsible for choosing the exporter (Prometheus, OTEL, etc.)
//!
//! # Metric Naming Convention
//! - `holiday_sync_` prefix for all metrics
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Labels
//! - `operation`: upstream_countries, upstream_holidays, sql_*, ...
//! - `outcome`: ok, exhausted, malformed, error
//! - `pass`: initial, periodic, refresh

use metrics::{counter, gauge, histogram};
use std::time::{Duration, Instant};

/// Record one retry of a named operation
pub fn record_retry(operation: &str) {
    counter!(
        "holiday_sync_retries_total",
        "operation" => operation.to_string()
    )
    .increment(1);
}

/// Record the final outcome of an upstream fetch
pub fn record_upstream_call(operation: &str, outcome: &str) {
    counter!(
        "holiday_sync_upstream_calls_total",
        "operation" => operation.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

/// Record the outcome of one (country, year) reconciliation
pub fn record_unit_outcome(outcome: &str) {
    counter!(
        "holiday_sync_units_total",
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

/// Record holiday rows written (inserted + updated)
pub fn record_holidays_written(count: usize) {
    counter!("holiday_sync_holidays_written_total").increment(count as u64);
}

/// Record holiday rows removed
pub fn record_holidays_deleted(count: usize) {
    counter!("holiday_sync_holidays_deleted_total").increment(count as u64);
}

/// Record country rows written (inserted + renamed)
pub fn record_countries_written(count: usize) {
    counter!("holiday_sync_countries_written_total").increment(count as u64);
}

/// Set number of countries currently stored
pub fn set_known_countries(count: usize) {
    gauge!("holiday_sync_known_countries").set(count as f64);
}

/// Record a completed sync pass
pub fn record_pass(pass: &str, duration: Duration, failed_units: usize) {
    histogram!(
        "holiday_sync_pass_seconds",
        "pass" => pass.to_string()
    )
    .record(duration.as_secs_f64());
    counter!(
        "holiday_sync_passes_total",
        "pass" => pass.to_string(),
        "status" => if failed_units == 0 { "success" } else { "partial" }
    )
    .increment(1);
}

/// Record a pass that could not start or aborted
pub fn record_pass_failure(pass: &str) {
    counter!(
        "holiday_sync_passes_total",
        "pass" => pass.to_string(),
        "status" => "error"
    )
    .increment(1);
}

/// Record a scheduled pass skipped because another pass held the gate
pub fn record_pass_skipped() {
    counter!("holiday_sync_passes_skipped_total").increment(1);
}

/// Record operation latency
pub fn record_latency(operation: &str, duration: Duration) {
    histogram!(
        "holiday_sync_operation_seconds",
        "operation" => operation.to_string()
    )
    .record(duration.as_secs_f64());
}

/// Record search result size
pub fn record_search_results(count: usize) {
    histogram!("holiday_sync_search_results").record(count as f64);
}

/// Timer guard that records latency on drop
pub struct LatencyTimer {
    operation: &'static str,
    start: Instant,
}

impl LatencyTimer {
    /// Start a new latency timer
    pub fn new(operation: &'static str) -> Self {
        Self {
            operation,
            start: Instant::now(),
        }
    }

    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Drop for LatencyTimer {
    fn drop(&mut self) {
        record_latency(self.operation, self.start.elapsed());
    }
}
