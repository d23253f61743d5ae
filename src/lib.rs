//! # Call Log Exporter Library
//!
//! Exports call-detail records from the Twilio REST API into a CSV file for a
//! date range. Built for operations and billing teams who need a flat file of
//! every call that ended inside a reporting period.
//!
//! ## Features
//!
//! - **Windowed Polling**: The requested range is split into fixed 5-minute
//!   windows so every API query stays small and a failed window is cheap to retry
//! - **Bounded Retry**: Each window is retried up to 10 times; an exhausted
//!   window is logged and skipped instead of failing the run
//! - **Deduplication**: Records are deduplicated by call SID, keeping the first occurrence
//! - **Projection**: Only the configured fields are exported, plus derived
//!   local-time columns when `startTime` is selected
//!
//! ## Quick Start
//!
//! ```no_run
//! use call_log_exporter::config::{ExportConfig, LocalZone};
//! use call_log_exporter::exporter::{ExportExecutor, RetryPolicy};
//! use call_log_exporter::fetcher::twilio_http::{TwilioCredentials, TwilioHttpClient};
//! use chrono::{TimeZone, Utc};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let credentials = TwilioCredentials::new("ACxxxxxxxx", "auth-token");
//! let client = TwilioHttpClient::new(credentials)?;
//!
//! let config = ExportConfig::new(
//!     Utc.with_ymd_and_hms(2024, 1, 1, 7, 0, 0).unwrap(),
//!     Utc.with_ymd_and_hms(2024, 1, 2, 7, 0, 0).unwrap(),
//!     "./calls.csv".into(),
//!     vec!["sid".to_string(), "startTime".to_string(), "duration".to_string()],
//!     LocalZone::System,
//! );
//!
//! let executor = ExportExecutor::new(&client, RetryPolicy::default());
//! let summary = executor.run(&config).await?;
//! println!("exported {} calls", summary.records_exported);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`planner`] - Splits the requested range into [`TimeWindow`]s
//! - [`fetcher`] - Retrieves one window of records with bounded retry
//! - [`reducer`] - Deduplicates and projects records, deriving local-time fields
//! - [`output`] - CSV sink
//! - [`exporter`] - Runs the stages in order and reports a summary
//! - [`cli`] / [`config`] - Argument and environment handling

#![warn(missing_docs)]
#![warn(clippy::all)]

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// CLI argument handling
pub mod cli;

/// Run configuration and environment loading
pub mod config;

/// Export orchestration
pub mod exporter;

/// Remote call sources and the retrying interval fetcher
pub mod fetcher;

/// Metric recording helpers
pub mod metrics;

/// Data output writers
pub mod output;

/// Time window planning
pub mod planner;

/// Record deduplication and projection
pub mod reducer;

/// A call record exactly as returned by the remote API (after key normalization).
pub type RawRecord = serde_json::Map<String, serde_json::Value>;

/// Field holding the provider's unique call identifier.
pub const ID_FIELD: &str = "sid";

/// Field holding the call start time in UTC.
pub const START_TIME_FIELD: &str = "startTime";

/// Derived field: start time rendered in the local zone with its offset.
pub const START_TIME_LOCAL_FIELD: &str = "startTimePT";

/// Derived field: local calendar date of the start time.
pub const DATE_LOCAL_FIELD: &str = "datePT";

/// Derived field: local wall-clock time of the start time, without offset.
pub const TIME_LOCAL_FIELD: &str = "timePT";

/// Half-open time interval `[after, before)` used to page through the API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeWindow {
    /// Inclusive lower bound
    pub after: DateTime<Utc>,
    /// Exclusive upper bound
    pub before: DateTime<Utc>,
}

impl TimeWindow {
    /// Create a window, rejecting empty or inverted bounds
    pub fn new(after: DateTime<Utc>, before: DateTime<Utc>) -> Result<Self, String> {
        if after >= before {
            return Err(format!(
                "Window start ({}) must be before window end ({})",
                after.to_rfc3339_opts(SecondsFormat::Secs, true),
                before.to_rfc3339_opts(SecondsFormat::Secs, true)
            ));
        }
        Ok(Self { after, before })
    }

    /// Width of the window
    pub fn duration(&self) -> chrono::Duration {
        self.before - self.after
    }

    /// Whether `instant` falls inside `[after, before)`
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.after <= instant && instant < self.before
    }
}

impl std::fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}, {})",
            self.after.to_rfc3339_opts(SecondsFormat::Secs, true),
            self.before.to_rfc3339_opts(SecondsFormat::Secs, true)
        )
    }
}
