//! Twilio Calls API response parsing
//!
//! The REST API returns snake_case keys and RFC 2822 timestamps. Records are
//! rewritten to lowerCamelCase keys with RFC 3339 timestamps, which is the
//! shape users name in `PROPERTIES`.

use crate::fetcher::{FetcherError, FetcherResult};
use crate::RawRecord;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

/// Record fields holding timestamps, after key normalization
pub const TIMESTAMP_FIELDS: [&str; 4] = ["dateCreated", "dateUpdated", "startTime", "endTime"];

/// One page of the Calls list resource
#[derive(Debug, Deserialize)]
pub struct CallsPage {
    /// Calls on this page
    #[serde(default)]
    pub calls: Vec<RawRecord>,
    /// Relative URI of the next page, absent on the last page
    #[serde(default)]
    pub next_page_uri: Option<String>,
    /// Zero-based page number
    #[serde(default)]
    pub page: u32,
}

/// Decode a page body
pub fn parse_calls_page(body: &str) -> FetcherResult<CallsPage> {
    serde_json::from_str(body)
        .map_err(|e| FetcherError::Parse(format!("Failed to decode calls page: {e}")))
}

/// Normalize every record of a page
pub fn normalize_page(page: CallsPage) -> Vec<RawRecord> {
    page.calls.into_iter().map(normalize_call).collect()
}

/// Convert top-level keys to lowerCamelCase and timestamps to RFC 3339
pub fn normalize_call(record: RawRecord) -> RawRecord {
    let mut normalized = RawRecord::new();

    for (key, value) in record {
        let key = snake_to_camel(&key);
        let value = if TIMESTAMP_FIELDS.contains(&key.as_str()) {
            normalize_timestamp(&key, value)
        } else {
            value
        };
        normalized.insert(key, value);
    }

    normalized
}

/// `start_time` -> `startTime`
pub fn snake_to_camel(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut upper_next = false;

    for ch in key.chars() {
        if ch == '_' {
            upper_next = !out.is_empty();
            continue;
        }
        if upper_next {
            out.extend(ch.to_uppercase());
            upper_next = false;
        } else {
            out.push(ch);
        }
    }

    out
}

/// Parse an API timestamp, accepting RFC 3339 or RFC 2822
pub fn parse_api_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .or_else(|_| DateTime::parse_from_rfc2822(raw))
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}

fn normalize_timestamp(key: &str, value: Value) -> Value {
    match &value {
        Value::String(raw) => match parse_api_timestamp(raw) {
            Some(dt) => Value::String(dt.to_rfc3339_opts(SecondsFormat::Millis, true)),
            None => {
                warn!(field = key, value = %raw, "Unrecognized timestamp, keeping verbatim");
                value
            }
        },
        _ => value,
    }
}
