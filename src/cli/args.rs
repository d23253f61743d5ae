//! Export command arguments
//!
//! The run itself is described by three positional `key=value` arguments in
//! any order; tuning knobs are regular flags.

use crate::config::{
    anchor_date, parse_day_anchor, parse_field_list, parse_strict_date, ConfigError,
    EnvSettings, ExportConfig, LocalZone, DEFAULT_DAY_ANCHOR,
};
use crate::exporter::config::MAX_ATTEMPTS;
use crate::exporter::{ExportExecutor, ExportSummary};
use crate::fetcher::twilio_http::TwilioHttpClient;
use crate::fetcher::RetryPolicy;
use crate::planner::DEFAULT_WINDOW_MINUTES;
use chrono::NaiveDate;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

use super::CliError;

/// `start-date=YYYY-MM-DD`
pub const ARG_START_DATE: &str = "start-date";
/// `end-date=YYYY-MM-DD`
pub const ARG_END_DATE: &str = "end-date";
/// `output-file=<path>`
pub const ARG_OUTPUT_FILE: &str = "output-file";

const KNOWN_KEYS: [&str; 3] = [ARG_START_DATE, ARG_END_DATE, ARG_OUTPUT_FILE];

/// Call Log Exporter CLI
#[derive(Parser, Debug)]
#[command(name = "call-log-exporter")]
#[command(about = "Export Twilio call logs for a date range to CSV", long_about = None)]
#[command(version)]
pub struct Cli {
    /// start-date=YYYY-MM-DD end-date=YYYY-MM-DD output-file=<path>, in any order
    #[arg(value_name = "KEY=VALUE")]
    pub pairs: Vec<String>,

    /// Comma-separated fields to export (overrides PROPERTIES)
    #[arg(long)]
    pub fields: Option<String>,

    /// IANA zone for the derived local-time columns (overrides EXPORT_TIMEZONE)
    #[arg(long)]
    pub timezone: Option<String>,

    /// UTC time of day at which each calendar date starts
    #[arg(long, default_value = DEFAULT_DAY_ANCHOR)]
    pub day_anchor: String,

    /// Width of each API query window in minutes
    #[arg(long, default_value_t = DEFAULT_WINDOW_MINUTES, value_parser = clap::value_parser!(i64).range(1..=1440))]
    pub window_minutes: i64,

    /// Attempts per window before it is skipped (range: 1-50)
    #[arg(long, default_value_t = MAX_ATTEMPTS, value_parser = clap::value_parser!(u32).range(1..=50))]
    pub max_attempts: u32,

    /// Base delay between attempts in milliseconds; 0 retries immediately
    #[arg(long, default_value_t = 0)]
    pub retry_backoff_ms: u64,
}

/// The three required run arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunArgs {
    /// First calendar date of the export
    pub start_date: NaiveDate,
    /// Calendar date at which the export stops (exclusive)
    pub end_date: NaiveDate,
    /// CSV destination
    pub output_file: PathBuf,
}

/// Parse and validate the positional `key=value` arguments
///
/// Checks run in a fixed order: presence of any argument, unknown keys,
/// missing keys (start-date, end-date, output-file), then date formats.
pub fn parse_run_args(pairs: &[String]) -> Result<RunArgs, CliError> {
    if pairs.is_empty() {
        return Err(CliError::NoArguments);
    }

    let mut values: [Option<&str>; 3] = [None; 3];
    for pair in pairs {
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| CliError::UnrecognizedArgument(pair.clone()))?;
        let slot = KNOWN_KEYS
            .iter()
            .position(|k| *k == key)
            .ok_or_else(|| CliError::UnrecognizedArgument(pair.clone()))?;
        // First occurrence wins
        if values[slot].is_none() {
            values[slot] = Some(value);
        }
    }

    let [start, end, output] = values;
    // A present but empty date is reported as invalid, not missing
    let start = start.ok_or(CliError::MissingArgument(ARG_START_DATE))?;
    let end = end.ok_or(CliError::MissingArgument(ARG_END_DATE))?;
    let output = output
        .filter(|v| !v.is_empty())
        .ok_or(CliError::MissingArgument(ARG_OUTPUT_FILE))?;

    let start_date = parse_strict_date(start).ok_or(CliError::InvalidDate(ARG_START_DATE))?;
    let end_date = parse_strict_date(end).ok_or(CliError::InvalidDate(ARG_END_DATE))?;

    Ok(RunArgs {
        start_date,
        end_date,
        output_file: PathBuf::from(output),
    })
}

impl Cli {
    /// Retry policy selected by flags
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::default()
            .with_max_attempts(self.max_attempts)
            .with_backoff_base(Duration::from_millis(self.retry_backoff_ms))
    }

    /// Combine run arguments, flags and environment into an [`ExportConfig`]
    pub fn build_config(&self, run: &RunArgs, env: &EnvSettings) -> Result<ExportConfig, CliError> {
        let anchor = parse_day_anchor(&self.day_anchor)?;

        let fields = match &self.fields {
            Some(raw) => parse_field_list(raw),
            None => env.properties.clone().unwrap_or_default(),
        };
        if fields.is_empty() {
            return Err(ConfigError::EmptyFieldList.into());
        }

        let zone = match self.timezone.as_deref().or(env.timezone.as_deref()) {
            Some(name) => LocalZone::parse(name)?,
            None => LocalZone::System,
        };

        Ok(ExportConfig::new(
            anchor_date(run.start_date, anchor),
            anchor_date(run.end_date, anchor),
            run.output_file.clone(),
            fields,
            zone,
        )
        .with_window_width(chrono::Duration::minutes(self.window_minutes)))
    }

    /// Validate everything, then run the export against the Twilio API
    pub async fn execute(&self) -> Result<ExportSummary, CliError> {
        let run = parse_run_args(&self.pairs)?;
        let env = EnvSettings::from_env();
        let config = self.build_config(&run, &env)?;
        let credentials = env.credentials()?;

        let mut client = TwilioHttpClient::new(credentials)?;
        if let Some(base) = &env.api_base {
            client = client.with_base_url(base);
        }

        info!(
            start = %config.start,
            end = %config.end,
            fields = %config.included_fields.join(","),
            zone = %config.zone,
            "Starting call log export"
        );

        let executor = ExportExecutor::new(&client, self.retry_policy());
        Ok(executor.run(&config).await?)
    }
}
