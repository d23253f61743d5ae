//! Export metrics
//!
//! Recorded through the `metrics` facade. The binary does not install an
//! exporter; embedders that install a recorder get fetch, retry and
//! missed-window counts for free.

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use std::time::Duration;

/// Register metric descriptions with whatever recorder is installed
pub fn describe_metrics() {
    describe_counter!(
        "calls_api_requests_total",
        Unit::Count,
        "Total number of page requests made to the Calls API"
    );
    describe_histogram!(
        "calls_api_request_duration_seconds",
        Unit::Seconds,
        "Calls API page request duration"
    );
    describe_counter!(
        "window_fetch_attempts_total",
        Unit::Count,
        "Total fetch attempts across all windows"
    );
    describe_counter!(
        "window_retries_total",
        Unit::Count,
        "Total window retries after a failed attempt"
    );
    describe_histogram!(
        "window_retry_backoff_seconds",
        Unit::Seconds,
        "Backoff applied before a window retry"
    );
    describe_counter!(
        "windows_missed_total",
        Unit::Count,
        "Windows dropped after exhausting their retry budget"
    );
    describe_histogram!(
        "window_fetch_duration_seconds",
        Unit::Seconds,
        "Time spent fetching one window, retries included"
    );
    describe_counter!(
        "calls_fetched_total",
        Unit::Count,
        "Raw call records received"
    );
    describe_counter!(
        "calls_exported_total",
        Unit::Count,
        "Deduplicated call records written"
    );
    describe_counter!(
        "calls_duplicates_total",
        Unit::Count,
        "Duplicate call records dropped"
    );
}

/// Record one page request; `status` is `None` on transport failure
pub fn record_page_request(status: Option<u16>, duration: Duration) {
    let status = status.map_or_else(|| "network_error".to_string(), |s| s.to_string());
    counter!("calls_api_requests_total", "status" => status).increment(1);
    histogram!("calls_api_request_duration_seconds").record(duration.as_secs_f64());
}

/// Record the start of a fetch attempt
pub fn record_fetch_attempt(attempt: u32) {
    counter!("window_fetch_attempts_total", "attempt" => attempt.to_string()).increment(1);
}

/// Record a retry scheduled after `failed_attempt`
pub fn record_retry(failed_attempt: u32, backoff: Duration) {
    counter!("window_retries_total", "attempt" => failed_attempt.to_string()).increment(1);
    if !backoff.is_zero() {
        histogram!("window_retry_backoff_seconds").record(backoff.as_secs_f64());
    }
}

/// Record a window given up on
pub fn record_window_missed() {
    counter!("windows_missed_total").increment(1);
}

/// Record a completed window fetch
pub fn record_window_fetched(records: usize, elapsed: Duration) {
    counter!("calls_fetched_total").increment(records as u64);
    histogram!("window_fetch_duration_seconds").record(elapsed.as_secs_f64());
}

/// Record the reduced output of a run
pub fn record_export(exported: usize, duplicates: usize) {
    counter!("calls_exported_total").increment(exported as u64);
    counter!("calls_duplicates_total").increment(duplicates as u64);
}
