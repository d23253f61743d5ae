//! Run configuration
//!
//! Everything the export needs is collected into an [`ExportConfig`] once at
//! startup and passed by reference to each stage.

use crate::fetcher::twilio_http::TwilioCredentials;
use crate::planner::default_window_width;
use crate::ID_FIELD;
use chrono::{DateTime, Local, NaiveDate, NaiveTime, Utc};
use chrono_tz::Tz;
use std::path::PathBuf;
use tracing::warn;

/// Account SID variable
pub const ENV_ACCOUNT_SID: &str = "TWILIO_ACCOUNT_SID";
/// Auth token variable
pub const ENV_AUTH_TOKEN: &str = "TWILIO_AUTH_TOKEN";
/// Comma-separated list of exported fields
pub const ENV_PROPERTIES: &str = "PROPERTIES";
/// Optional API host override
pub const ENV_API_BASE: &str = "TWILIO_API_BASE";
/// Optional IANA zone for the derived local-time fields
pub const ENV_TIMEZONE: &str = "EXPORT_TIMEZONE";

/// Default time of day (UTC) that a calendar date is anchored to
pub const DEFAULT_DAY_ANCHOR: &str = "07:00:00";

const LOCAL_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%:z";

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Required environment variable not set
    #[error("missing environment variable {0}")]
    MissingEnv(&'static str),

    /// Field list contained no names
    #[error("no fields selected; set PROPERTIES or pass --fields")]
    EmptyFieldList,

    /// Unknown IANA zone name
    #[error("invalid time zone: {0}")]
    InvalidTimezone(String),

    /// Day anchor not in HH:MM:SS form
    #[error("invalid day anchor \"{0}\": must be in format \"HH:MM:SS\"")]
    InvalidDayAnchor(String),
}

/// Zone used to render the derived local-time fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LocalZone {
    /// Zone of the executing process
    #[default]
    System,
    /// Named IANA zone
    Named(Tz),
}

impl LocalZone {
    /// Parse an IANA name; `local` or `system` selects the process zone
    pub fn parse(name: &str) -> Result<Self, ConfigError> {
        let name = name.trim();
        if name.eq_ignore_ascii_case("local") || name.eq_ignore_ascii_case("system") {
            return Ok(Self::System);
        }
        name.parse::<Tz>()
            .map(Self::Named)
            .map_err(|e| ConfigError::InvalidTimezone(format!("{name}: {e}")))
    }

    /// Render `utc` as `YYYY-MM-DDTHH:MM:SS±HH:MM` in this zone
    pub fn format_rfc3339(&self, utc: DateTime<Utc>) -> String {
        match self {
            Self::System => utc.with_timezone(&Local).format(LOCAL_TIME_FORMAT).to_string(),
            Self::Named(tz) => utc.with_timezone(tz).format(LOCAL_TIME_FORMAT).to_string(),
        }
    }
}

impl std::fmt::Display for LocalZone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::System => write!(f, "system"),
            Self::Named(tz) => write!(f, "{}", tz.name()),
        }
    }
}

/// Immutable configuration for one export run
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// Inclusive start of the export range
    pub start: DateTime<Utc>,
    /// Exclusive end of the export range
    pub end: DateTime<Utc>,
    /// CSV destination
    pub output_path: PathBuf,
    /// Fields to export, in column order
    pub included_fields: Vec<String>,
    /// Zone for derived local-time fields
    pub zone: LocalZone,
    /// Width of each API query window
    pub window_width: chrono::Duration,
}

impl ExportConfig {
    /// Create a configuration with the default 5-minute window width
    pub fn new(
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        output_path: PathBuf,
        included_fields: Vec<String>,
        zone: LocalZone,
    ) -> Self {
        if !included_fields.iter().any(|f| f == ID_FIELD) {
            warn!(
                "Field list does not include \"{ID_FIELD}\"; records are still deduplicated on it but it will not be exported"
            );
        }

        Self {
            start,
            end,
            output_path,
            included_fields,
            zone,
            window_width: default_window_width(),
        }
    }

    /// Override the window width
    pub fn with_window_width(mut self, width: chrono::Duration) -> Self {
        self.window_width = width;
        self
    }
}

/// Settings read from the environment
#[derive(Debug, Clone, Default)]
pub struct EnvSettings {
    /// Account SID
    pub account_sid: Option<String>,
    /// Auth token
    pub auth_token: Option<String>,
    /// Exported field list
    pub properties: Option<Vec<String>>,
    /// API host override
    pub api_base: Option<String>,
    /// Local zone name
    pub timezone: Option<String>,
}

impl EnvSettings {
    /// Read settings from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through `lookup`; blank values count as unset
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            account_sid: get(ENV_ACCOUNT_SID),
            auth_token: get(ENV_AUTH_TOKEN),
            properties: get(ENV_PROPERTIES).map(|v| parse_field_list(&v)),
            api_base: get(ENV_API_BASE),
            timezone: get(ENV_TIMEZONE),
        }
    }

    /// API credentials, failing if either half is missing
    pub fn credentials(&self) -> Result<TwilioCredentials, ConfigError> {
        let sid = self
            .account_sid
            .as_deref()
            .ok_or(ConfigError::MissingEnv(ENV_ACCOUNT_SID))?;
        let token = self
            .auth_token
            .as_deref()
            .ok_or(ConfigError::MissingEnv(ENV_AUTH_TOKEN))?;
        Ok(TwilioCredentials::new(sid, token))
    }
}

/// Split a comma-separated field list, trimming blanks
pub fn parse_field_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse a strict `YYYY-MM-DD` calendar date
pub fn parse_strict_date(raw: &str) -> Option<NaiveDate> {
    let bytes = raw.as_bytes();
    let shape_ok = bytes.len() == 10
        && bytes[4] == b'-'
        && bytes[7] == b'-'
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| i == 4 || i == 7 || b.is_ascii_digit());

    if !shape_ok {
        return None;
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

/// Parse a `HH:MM:SS` day anchor
pub fn parse_day_anchor(raw: &str) -> Result<NaiveTime, ConfigError> {
    NaiveTime::parse_from_str(raw.trim(), "%H:%M:%S")
        .map_err(|_| ConfigError::InvalidDayAnchor(raw.to_string()))
}

/// Instant at which `date` begins for this export
pub fn anchor_date(date: NaiveDate, anchor: NaiveTime) -> DateTime<Utc> {
    date.and_time(anchor).and_utc()
}
