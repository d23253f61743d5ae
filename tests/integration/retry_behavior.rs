//! Integration tests for per-window retry behavior

use crate::support::{call, fields, server_error, utc, ScriptedSource};
use call_log_exporter::config::{ExportConfig, LocalZone};
use call_log_exporter::exporter::{ExportExecutor, RetryPolicy};
use call_log_exporter::fetcher::IntervalFetcher;
use call_log_exporter::TimeWindow;
use tempfile::TempDir;

fn first_window() -> TimeWindow {
    TimeWindow::new(utc(2024, 1, 1, 7, 0), utc(2024, 1, 1, 7, 5)).unwrap()
}

#[tokio::test]
async fn test_three_failures_then_success_returns_records() {
    let source = ScriptedSource::flaky(3, vec![call("CA1", "2024-01-01T07:02:00Z")]);
    let fetcher = IntervalFetcher::new(&source, RetryPolicy::default());

    let outcome = fetcher.fetch_with_outcome(&first_window()).await;

    assert_eq!(outcome.records.len(), 1);
    assert_eq!(outcome.attempts, 4);
    assert!(!outcome.missed);
    assert_eq!(source.requests().len(), 4);
}

#[tokio::test]
async fn test_ten_failures_return_empty_without_error() {
    let source = ScriptedSource::new(|_, _| Err(server_error()));
    let fetcher = IntervalFetcher::new(&source, RetryPolicy::default());

    let records = fetcher.fetch(&first_window()).await;

    assert!(records.is_empty());
    assert_eq!(source.requests().len(), 10, "default budget is 10 attempts");
}

#[tokio::test]
async fn test_custom_attempt_budget_is_respected() {
    let source = ScriptedSource::new(|_, _| Err(server_error()));
    let fetcher = IntervalFetcher::new(&source, RetryPolicy::default().with_max_attempts(3));

    let outcome = fetcher.fetch_with_outcome(&first_window()).await;

    assert!(outcome.missed);
    assert_eq!(outcome.attempts, 3);
    assert_eq!(source.requests().len(), 3);
}

#[tokio::test]
async fn test_missed_window_does_not_stop_following_windows() {
    let dir = TempDir::new().unwrap();
    let missed_start = utc(2024, 1, 1, 7, 0);

    let source = ScriptedSource::new(move |window, _| {
        if window.after == missed_start {
            Err(server_error())
        } else {
            Ok(vec![call("CA2", "2024-01-01T07:06:00Z")])
        }
    });

    let config = ExportConfig::new(
        utc(2024, 1, 1, 7, 0),
        utc(2024, 1, 1, 7, 10),
        dir.path().join("calls.csv"),
        fields(&["sid"]),
        LocalZone::System,
    );

    let summary = ExportExecutor::new(&source, RetryPolicy::default())
        .run(&config)
        .await
        .unwrap();

    assert_eq!(summary.windows_planned, 2);
    assert_eq!(summary.windows_missed, vec![first_window()]);
    assert_eq!(summary.records_exported, 1);
    // 10 attempts on the broken window, 1 on the healthy one
    assert_eq!(source.requests().len(), 11);

    let contents = std::fs::read_to_string(dir.path().join("calls.csv")).unwrap();
    assert_eq!(contents, "sid\nCA2\n");
}

#[tokio::test]
async fn test_windows_fetched_sequentially_in_plan_order() {
    let dir = TempDir::new().unwrap();
    let source = ScriptedSource::new(|_, _| Ok(Vec::new()));

    let config = ExportConfig::new(
        utc(2024, 1, 1, 7, 0),
        utc(2024, 1, 1, 7, 20),
        dir.path().join("calls.csv"),
        fields(&["sid"]),
        LocalZone::System,
    );

    ExportExecutor::new(&source, RetryPolicy::default())
        .run(&config)
        .await
        .unwrap();

    let starts: Vec<_> = source.requests().iter().map(|w| w.after).collect();
    assert_eq!(
        starts,
        vec![
            utc(2024, 1, 1, 7, 0),
            utc(2024, 1, 1, 7, 5),
            utc(2024, 1, 1, 7, 10),
            utc(2024, 1, 1, 7, 15),
        ]
    );
}
