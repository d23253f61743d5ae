//! Export executor

use std::time::Instant;
use tracing::{info, warn};

use crate::config::ExportConfig;
use crate::exporter::{ExportError, ExportSummary};
use crate::fetcher::{CallSource, IntervalFetcher, RetryPolicy};
use crate::metrics;
use crate::output::csv::write_calls_csv;
use crate::planner::plan_windows;
use crate::reducer::{header_for, reduce_with_stats};

/// Runs one export from plan to CSV
pub struct ExportExecutor<S> {
    fetcher: IntervalFetcher<S>,
}

impl<S: CallSource> ExportExecutor<S> {
    /// Create an executor reading from `source`
    pub fn new(source: S, policy: RetryPolicy) -> Self {
        Self {
            fetcher: IntervalFetcher::new(source, policy),
        }
    }

    /// Run the export described by `config`
    pub async fn run(&self, config: &ExportConfig) -> Result<ExportSummary, ExportError> {
        if config.included_fields.is_empty() {
            return Err(ExportError::Validation(
                "at least one field must be selected for export".to_string(),
            ));
        }
        if config.window_width <= chrono::Duration::zero() {
            return Err(ExportError::Validation(
                "window width must be positive".to_string(),
            ));
        }

        let windows = plan_windows(config.start, config.end, config.window_width);
        info!(
            start = %config.start,
            end = %config.end,
            windows = windows.len(),
            max_attempts = self.fetcher.policy().max_attempts,
            "Retrieving call logs"
        );

        let started = Instant::now();
        let mut all_calls = Vec::new();
        let mut missed = Vec::new();

        for (index, window) in windows.iter().enumerate() {
            info!(
                window = %window,
                index = index + 1,
                total = windows.len(),
                "Retrieving interval"
            );

            let outcome = self.fetcher.fetch_with_outcome(window).await;

            info!(
                calls = outcome.records.len(),
                attempts = outcome.attempts,
                retrieval_ms = outcome.elapsed.as_millis() as u64,
                "Retrieved {} calls",
                outcome.records.len()
            );
            metrics::record_window_fetched(outcome.records.len(), outcome.elapsed);

            if outcome.missed {
                missed.push(*window);
            }
            all_calls.extend(outcome.records);
        }

        let raw_records = all_calls.len();
        let reduced = reduce_with_stats(all_calls, &config.included_fields, &config.zone);
        let retrieval_time = started.elapsed();

        info!(
            total_calls = reduced.records.len(),
            duplicates = reduced.duplicates_skipped,
            retrieval_ms = retrieval_time.as_millis() as u64,
            "All call logs retrieved. Total calls: {}",
            reduced.records.len()
        );

        let header = header_for(&config.included_fields);
        let records_exported = write_calls_csv(&config.output_path, header, &reduced.records)?;
        metrics::record_export(reduced.records.len(), reduced.duplicates_skipped);

        info!(
            path = %config.output_path.display(),
            rows = records_exported,
            "Call logs saved to file"
        );

        if !missed.is_empty() {
            warn!(
                missed = missed.len(),
                windows = windows.len(),
                "Export is incomplete: {} interval(s) could not be retrieved",
                missed.len()
            );
        }

        Ok(ExportSummary {
            windows_planned: windows.len(),
            windows_missed: missed,
            raw_records,
            duplicates_skipped: reduced.duplicates_skipped,
            records_exported,
            output_path: config.output_path.clone(),
            retrieval_time,
        })
    }
}
