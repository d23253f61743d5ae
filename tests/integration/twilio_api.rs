//! Twilio client against a local HTTP server

use crate::support::{utc, FakeApi};
use call_log_exporter::fetcher::twilio_http::{TwilioCredentials, TwilioHttpClient};
use call_log_exporter::fetcher::{CallSource, FetcherError};
use call_log_exporter::TimeWindow;
use serde_json::json;

// base64("AC1:secret")
const BASIC_AUTH: &str = "Basic QUMxOnNlY3JldA==";

fn window() -> TimeWindow {
    TimeWindow::new(utc(2024, 1, 1, 7, 0), utc(2024, 1, 1, 7, 5)).unwrap()
}

fn client(api: &FakeApi) -> TwilioHttpClient {
    TwilioHttpClient::new(TwilioCredentials::new("AC1", "secret"))
        .unwrap()
        .with_base_url(api.base_url.clone())
}

fn authorization(request: &str) -> Option<&str> {
    request.lines().find_map(|line| {
        let (name, value) = line.split_once(':')?;
        name.eq_ignore_ascii_case("authorization").then(|| value.trim())
    })
}

fn calls_page(sid: &str, start_time: &str, next_page_uri: Option<&str>) -> String {
    json!({
        "calls": [{
            "sid": sid,
            "start_time": start_time,
            "status": "completed",
        }],
        "next_page_uri": next_page_uri,
        "page": 0,
        "page_size": 1000,
    })
    .to_string()
}

#[tokio::test]
async fn test_follows_next_page_uri_with_auth() {
    let api = FakeApi::serve(vec![
        (
            200,
            calls_page(
                "CA1",
                "Mon, 01 Jan 2024 07:02:00 +0000",
                Some("/2010-04-01/Accounts/AC1/Calls.json?Page=1&PageToken=X"),
            ),
        ),
        (200, calls_page("CA2", "Mon, 01 Jan 2024 07:03:00 +0000", None)),
    ])
    .await;

    let records = client(&api).list_calls(&window()).await.unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["sid"], json!("CA1"));
    assert_eq!(records[0]["startTime"], json!("2024-01-01T07:02:00.000Z"));
    assert_eq!(records[1]["sid"], json!("CA2"));

    let requests = api.requests();
    assert_eq!(requests.len(), 2);
    assert!(
        requests[0].starts_with(
            "GET /2010-04-01/Accounts/AC1/Calls.json?EndTime%3E=2024-01-01T07%3A00%3A00Z&EndTime%3C=2024-01-01T07%3A05%3A00Z&PageSize=1000 "
        ),
        "{}",
        requests[0]
    );
    assert!(
        requests[1].starts_with("GET /2010-04-01/Accounts/AC1/Calls.json?Page=1&PageToken=X "),
        "{}",
        requests[1]
    );
    for request in &requests {
        assert_eq!(authorization(request), Some(BASIC_AUTH), "{request}");
    }
}

#[tokio::test]
async fn test_unauthorized_maps_to_http_error() {
    let api = FakeApi::serve(vec![(401, r#"{"code":20003}"#.to_string())]).await;

    let err = client(&api).list_calls(&window()).await.unwrap_err();

    match err {
        FetcherError::Http { status, body } => {
            assert_eq!(status, 401);
            assert_eq!(body, r#"{"code":20003}"#);
        }
        other => panic!("expected HTTP error, got {other:?}"),
    }
    assert_eq!(api.requests().len(), 1);
}

#[tokio::test]
async fn test_garbage_body_maps_to_parse_error() {
    let api = FakeApi::serve(vec![(200, "<html>maintenance</html>".to_string())]).await;

    let err = client(&api).list_calls(&window()).await.unwrap_err();

    assert!(matches!(err, FetcherError::Parse(_)), "{err:?}");
}

#[tokio::test]
async fn test_error_on_second_page_fails_the_window() {
    let api = FakeApi::serve(vec![
        (
            200,
            calls_page(
                "CA1",
                "Mon, 01 Jan 2024 07:02:00 +0000",
                Some("/2010-04-01/Accounts/AC1/Calls.json?Page=1&PageToken=X"),
            ),
        ),
        (503, "Service Unavailable".to_string()),
    ])
    .await;

    let err = client(&api).list_calls(&window()).await.unwrap_err();

    assert!(matches!(err, FetcherError::Http { status: 503, .. }), "{err:?}");
}
