//! Record deduplication and projection
//!
//! Consecutive windows share exact boundaries and a window may be fetched
//! more than once, so the same call can show up twice. Records are reduced
//! by call SID keeping the first occurrence, then projected onto the
//! configured fields.

use crate::config::LocalZone;
use crate::fetcher::twilio_parser::parse_api_timestamp;
use crate::{
    RawRecord, DATE_LOCAL_FIELD, ID_FIELD, START_TIME_FIELD, START_TIME_LOCAL_FIELD,
    TIME_LOCAL_FIELD,
};
use serde_json::Value;
use std::collections::HashSet;
use tracing::{debug, warn};

/// A record reduced to the configured fields plus derived local-time fields
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectedRecord {
    values: Vec<(String, Value)>,
}

impl ProjectedRecord {
    /// Value of `field`, if it was projected
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.values
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value)
    }

    /// Field names in projection order
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(|(name, _)| name.as_str())
    }

    fn insert(&mut self, field: &str, value: Value) {
        match self.values.iter_mut().find(|(name, _)| name == field) {
            Some(slot) => slot.1 = value,
            None => self.values.push((field.to_string(), value)),
        }
    }
}

/// Local-time rendering of a call's start time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalTimeFields {
    /// `YYYY-MM-DDTHH:MM:SS±HH:MM`
    pub start_time_local: String,
    /// `YYYY-MM-DD`
    pub date: String,
    /// `HH:MM:SS`
    pub time: String,
}

/// Reduced records and bookkeeping counts
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReduceOutcome {
    /// Unique records in first-occurrence order
    pub records: Vec<ProjectedRecord>,
    /// Records dropped because their SID was already seen
    pub duplicates_skipped: usize,
    /// Records kept without a SID to deduplicate on
    pub missing_ids: usize,
}

/// Whether the projection gets derived local-time columns
pub fn includes_start_time(included_fields: &[String]) -> bool {
    included_fields.iter().any(|f| f == START_TIME_FIELD)
}

/// CSV header: configured fields in order (first occurrence wins), then the
/// derived fields when `startTime` is included
pub fn header_for(included_fields: &[String]) -> Vec<String> {
    let mut header: Vec<String> = Vec::with_capacity(included_fields.len() + 3);
    for field in included_fields {
        if !header.contains(field) {
            header.push(field.clone());
        }
    }
    if includes_start_time(included_fields) {
        for derived in [START_TIME_LOCAL_FIELD, DATE_LOCAL_FIELD, TIME_LOCAL_FIELD] {
            if !header.iter().any(|h| h == derived) {
                header.push(derived.to_string());
            }
        }
    }
    header
}

/// Deduplicate and project `records`
pub fn reduce<I>(records: I, included_fields: &[String], zone: &LocalZone) -> Vec<ProjectedRecord>
where
    I: IntoIterator<Item = RawRecord>,
{
    reduce_with_stats(records, included_fields, zone).records
}

/// Deduplicate and project `records`, reporting skip counts
pub fn reduce_with_stats<I>(records: I, included_fields: &[String], zone: &LocalZone) -> ReduceOutcome
where
    I: IntoIterator<Item = RawRecord>,
{
    let mut seen: HashSet<String> = HashSet::new();
    let mut outcome = ReduceOutcome::default();
    let derive_local = includes_start_time(included_fields);

    for record in records {
        match record_id(&record) {
            Some(id) => {
                if !seen.insert(id) {
                    outcome.duplicates_skipped += 1;
                    continue;
                }
            }
            None => outcome.missing_ids += 1,
        }

        outcome
            .records
            .push(project(&record, included_fields, derive_local, zone));
    }

    if outcome.missing_ids > 0 {
        warn!(
            records = outcome.missing_ids,
            "Records without a {ID_FIELD} were kept without deduplication"
        );
    }
    debug!(
        unique = outcome.records.len(),
        duplicates = outcome.duplicates_skipped,
        "Reduced call records"
    );

    outcome
}

/// Render a UTC timestamp string in `zone` and split it into date and time
pub fn derive_local_time(raw: &str, zone: &LocalZone) -> Option<LocalTimeFields> {
    let utc = parse_api_timestamp(raw)?;
    let start_time_local = zone.format_rfc3339(utc);

    let (date, time_with_offset) = start_time_local.split_once('T')?;
    let time = match time_with_offset.find(['+', '-', 'Z']) {
        Some(idx) => &time_with_offset[..idx],
        None => time_with_offset,
    };

    Some(LocalTimeFields {
        date: date.to_string(),
        time: time.to_string(),
        start_time_local,
    })
}

fn record_id(record: &RawRecord) -> Option<String> {
    match record.get(ID_FIELD)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn project(
    record: &RawRecord,
    included_fields: &[String],
    derive_local: bool,
    zone: &LocalZone,
) -> ProjectedRecord {
    let mut projected = ProjectedRecord {
        values: Vec::with_capacity(included_fields.len() + 3),
    };

    for field in included_fields {
        let value = record.get(field).cloned().unwrap_or(Value::Null);
        projected.insert(field, value);
    }

    if derive_local {
        let local = record
            .get(START_TIME_FIELD)
            .and_then(Value::as_str)
            .and_then(|raw| derive_local_time(raw, zone));

        match local {
            Some(local) => {
                projected.insert(START_TIME_LOCAL_FIELD, Value::String(local.start_time_local));
                projected.insert(DATE_LOCAL_FIELD, Value::String(local.date));
                projected.insert(TIME_LOCAL_FIELD, Value::String(local.time));
            }
            None => {
                debug!(sid = ?record.get(ID_FIELD), "No usable start time; local fields left empty");
                for derived in [START_TIME_LOCAL_FIELD, DATE_LOCAL_FIELD, TIME_LOCAL_FIELD] {
                    projected.insert(derived, Value::Null);
                }
            }
        }
    }

    projected
}
