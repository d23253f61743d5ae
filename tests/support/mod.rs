//! Shared test doubles

use async_trait::async_trait;
use call_log_exporter::fetcher::{CallSource, FetcherError, FetcherResult};
use call_log_exporter::{RawRecord, TimeWindow};
use chrono::{DateTime, TimeZone, Utc};
use serde_json::json;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing_subscriber::fmt::MakeWriter;

type Responder = dyn Fn(&TimeWindow, usize) -> FetcherResult<Vec<RawRecord>> + Send + Sync;

/// Call source driven by a closure, recording every request
///
/// The closure receives the window and the zero-based number of earlier
/// requests for that same window.
pub struct ScriptedSource {
    responder: Box<Responder>,
    requests: Mutex<Vec<TimeWindow>>,
}

impl ScriptedSource {
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&TimeWindow, usize) -> FetcherResult<Vec<RawRecord>> + Send + Sync + 'static,
    {
        Self {
            responder: Box::new(responder),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Source that fails `failures` times per window, then returns `records`
    pub fn flaky(failures: usize, records: Vec<RawRecord>) -> Self {
        Self::new(move |_, seen| {
            if seen < failures {
                Err(server_error())
            } else {
                Ok(records.clone())
            }
        })
    }

    pub fn requests(&self) -> Vec<TimeWindow> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl CallSource for ScriptedSource {
    async fn list_calls(&self, window: &TimeWindow) -> FetcherResult<Vec<RawRecord>> {
        let seen = {
            let mut requests = self.requests.lock().unwrap();
            let seen = requests.iter().filter(|w| *w == window).count();
            requests.push(*window);
            seen
        };
        (self.responder)(window, seen)
    }

    fn endpoint(&self) -> String {
        "scripted://calls".to_string()
    }
}

pub fn server_error() -> FetcherError {
    FetcherError::Http {
        status: 503,
        body: "Service Unavailable".to_string(),
    }
}

pub fn call(sid: &str, start_time: &str) -> RawRecord {
    let mut record = RawRecord::new();
    record.insert("sid".to_string(), json!(sid));
    record.insert("startTime".to_string(), json!(start_time));
    record.insert("status".to_string(), json!("completed"));
    record.insert("duration".to_string(), json!("42"));
    record
}

pub fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
}

pub fn fields(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

/// Local HTTP server answering each connection with the next canned response
///
/// Every response closes its connection, so one response is served per
/// request. Request heads (request line plus headers) are recorded.
pub struct FakeApi {
    pub base_url: String,
    requests: Arc<Mutex<Vec<String>>>,
}

impl FakeApi {
    pub async fn serve(responses: Vec<(u16, String)>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let log = requests.clone();

        tokio::spawn(async move {
            for (status, body) in responses {
                let Ok((mut stream, _)) = listener.accept().await else {
                    return;
                };
                let head = read_request_head(&mut stream).await;
                log.lock().unwrap().push(head);

                let response = format!(
                    "HTTP/1.1 {status} Canned\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = stream.write_all(response.as_bytes()).await;
                let _ = stream.shutdown().await;
            }
        });

        Self {
            base_url: format!("http://{addr}"),
            requests,
        }
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

async fn read_request_head(stream: &mut TcpStream) -> String {
    let mut head = Vec::new();
    let mut chunk = [0u8; 1024];
    while !head.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = stream.read(&mut chunk).await.unwrap_or(0);
        if n == 0 {
            break;
        }
        head.extend_from_slice(&chunk[..n]);
    }
    String::from_utf8_lossy(&head).into_owned()
}

/// In-memory log sink for a scoped tracing subscriber
#[derive(Clone, Default)]
pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl std::io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}
