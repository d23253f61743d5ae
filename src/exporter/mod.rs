//! Export orchestration
//!
//! The export runs four stages strictly in order:
//!
//! 1. **Plan**: split the range into windows ([`crate::planner`])
//! 2. **Fetch**: retrieve each window with bounded retry ([`crate::fetcher::IntervalFetcher`])
//! 3. **Reduce**: deduplicate and project ([`crate::reducer`])
//! 4. **Write**: serialize to CSV ([`crate::output::csv`])
//!
//! Windows are fetched one at a time. A window that exhausts its retries is
//! recorded in the [`ExportSummary`] and the run carries on; only a failure
//! to write the output ends the run with an error.

pub mod config;
pub mod executor;

pub use crate::fetcher::RetryPolicy;
pub use executor::ExportExecutor;

use crate::output::OutputError;
use crate::TimeWindow;
use std::path::PathBuf;
use std::time::Duration;

/// Export errors
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// Output could not be written
    #[error("output error: {0}")]
    Output(#[from] OutputError),

    /// Configuration rejected before any work started
    #[error("validation error: {0}")]
    Validation(String),
}

/// What one export run did
#[derive(Debug, Clone, PartialEq)]
pub struct ExportSummary {
    /// Windows in the plan
    pub windows_planned: usize,
    /// Windows dropped after exhausting their retries
    pub windows_missed: Vec<TimeWindow>,
    /// Records received across all windows, duplicates included
    pub raw_records: usize,
    /// Records dropped as duplicates
    pub duplicates_skipped: usize,
    /// Data rows written
    pub records_exported: u64,
    /// File written
    pub output_path: PathBuf,
    /// Total fetch time
    pub retrieval_time: Duration,
}

impl ExportSummary {
    /// Whether every window was fetched
    pub fn is_complete(&self) -> bool {
        self.windows_missed.is_empty()
    }
}
