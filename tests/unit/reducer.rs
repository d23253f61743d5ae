//! Unit tests for record deduplication and projection

use crate::support::{call, fields};
use call_log_exporter::config::LocalZone;
use call_log_exporter::reducer::{derive_local_time, reduce, reduce_with_stats};
use serde_json::json;

fn utc_zone() -> LocalZone {
    LocalZone::parse("UTC").unwrap()
}

#[test]
fn test_first_occurrence_order_is_preserved() {
    let records = vec![
        call("A", "2024-01-01T07:00:00Z"),
        call("B", "2024-01-01T07:01:00Z"),
        call("A", "2024-01-01T07:02:00Z"),
        call("C", "2024-01-01T07:03:00Z"),
    ];

    let reduced = reduce(records, &fields(&["sid", "startTime"]), &utc_zone());

    let sids: Vec<_> = reduced.iter().map(|r| r.get("sid").cloned()).collect();
    assert_eq!(sids, vec![Some(json!("A")), Some(json!("B")), Some(json!("C"))]);
    // First A wins
    assert_eq!(reduced[0].get("startTime"), Some(&json!("2024-01-01T07:00:00Z")));
}

#[test]
fn test_same_record_twice_yields_one() {
    let record = call("CA1", "2024-01-01T07:02:00Z");
    let outcome = reduce_with_stats(
        vec![record.clone(), record],
        &fields(&["sid"]),
        &utc_zone(),
    );

    assert_eq!(outcome.records.len(), 1);
    assert_eq!(outcome.duplicates_skipped, 1);
}

#[test]
fn test_dedup_uses_sid_even_when_not_projected() {
    let reduced = reduce(
        vec![call("CA1", "2024-01-01T07:02:00Z"), call("CA1", "2024-01-01T07:02:00Z")],
        &fields(&["status"]),
        &utc_zone(),
    );
    assert_eq!(reduced.len(), 1);
    assert_eq!(reduced[0].get("sid"), None);
}

#[test]
fn test_derived_fields_only_with_start_time() {
    let without = reduce(
        vec![call("CA1", "2024-01-01T07:02:00Z")],
        &fields(&["sid"]),
        &utc_zone(),
    );
    assert_eq!(without[0].get("startTimePT"), None);

    let with = reduce(
        vec![call("CA1", "2024-01-01T07:02:00Z")],
        &fields(&["startTime", "sid"]),
        &utc_zone(),
    );
    assert_eq!(
        with[0].fields().collect::<Vec<_>>(),
        vec!["startTime", "sid", "startTimePT", "datePT", "timePT"]
    );
}

#[test]
fn test_date_and_time_reconstruct_local_timestamp() {
    let zones = ["UTC", "America/Los_Angeles", "Asia/Kolkata", "Pacific/Chatham"];
    let instants = [
        "2024-01-01T07:02:00Z",
        "2024-07-04T23:59:59.000Z",
        "2024-03-10T10:30:00Z",
        "Mon, 01 Jan 2024 00:00:01 +0000",
    ];

    for zone in zones {
        let zone = LocalZone::parse(zone).unwrap();
        for instant in instants {
            let local = derive_local_time(instant, &zone).unwrap();
            let rebuilt = format!("{}T{}", local.date, local.time);
            assert!(
                local.start_time_local.starts_with(&rebuilt),
                "{rebuilt} is not a prefix of {}",
                local.start_time_local
            );
            assert_eq!(local.start_time_local.len(), rebuilt.len() + 6);
        }
    }
}

#[test]
fn test_local_time_for_pacific_zone() {
    let zone = LocalZone::parse("America/Los_Angeles").unwrap();

    let winter = derive_local_time("2024-01-01T07:02:00Z", &zone).unwrap();
    assert_eq!(winter.start_time_local, "2023-12-31T23:02:00-08:00");
    assert_eq!(winter.date, "2023-12-31");
    assert_eq!(winter.time, "23:02:00");

    let summer = derive_local_time("2024-07-01T07:02:00Z", &zone).unwrap();
    assert_eq!(summer.start_time_local, "2024-07-01T00:02:00-07:00");
}

#[test]
fn test_positive_offsets_are_stripped_from_time() {
    let zone = LocalZone::parse("Asia/Kolkata").unwrap();
    let local = derive_local_time("2024-01-01T07:02:00Z", &zone).unwrap();
    assert_eq!(local.start_time_local, "2024-01-01T12:32:00+05:30");
    assert_eq!(local.time, "12:32:00");
}
