//! Twilio REST client for the Calls list resource
//!
//! Lists calls by end time using the `EndTime>` / `EndTime<` filters and
//! follows every page of the result.

use async_trait::async_trait;
use chrono::SecondsFormat;
use reqwest::Client;
use std::fmt;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::fetcher::pagination::{collect_pages, PAGE_SIZE};
use crate::fetcher::twilio_parser::{parse_calls_page, CallsPage};
use crate::fetcher::{CallSource, FetcherError, FetcherResult};
use crate::metrics;
use crate::{RawRecord, TimeWindow};

/// Default API host
pub const DEFAULT_BASE_URL: &str = "https://api.twilio.com";

/// REST API version segment
const API_VERSION: &str = "2010-04-01";

/// HTTP connect timeout (seconds)
const HTTP_CONNECT_TIMEOUT_SECS: u64 = 10;
/// HTTP request timeout (seconds)
const HTTP_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Account credentials for HTTP basic auth
#[derive(Clone, PartialEq, Eq)]
pub struct TwilioCredentials {
    account_sid: String,
    auth_token: String,
}

impl TwilioCredentials {
    /// Create credentials from an account SID and auth token
    pub fn new(account_sid: impl Into<String>, auth_token: impl Into<String>) -> Self {
        Self {
            account_sid: account_sid.into(),
            auth_token: auth_token.into(),
        }
    }

    /// Account SID (`AC...`)
    pub fn account_sid(&self) -> &str {
        &self.account_sid
    }
}

impl fmt::Debug for TwilioCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TwilioCredentials")
            .field("account_sid", &self.account_sid)
            .field("auth_token", &"<redacted>")
            .finish()
    }
}

/// HTTP client for the Twilio Calls resource
pub struct TwilioHttpClient {
    client: Client,
    base_url: String,
    credentials: TwilioCredentials,
}

impl TwilioHttpClient {
    /// Create a client against the default API host
    pub fn new(credentials: TwilioCredentials) -> FetcherResult<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(HTTP_CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(HTTP_REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| FetcherError::Configuration(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            credentials,
        })
    }

    /// Override the API host (regional edge or a local test server)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// API host in use
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// URL of the first page of the Calls list
    pub fn calls_url(&self) -> String {
        format!(
            "{}/{}/Accounts/{}/Calls.json",
            self.base_url,
            API_VERSION,
            self.credentials.account_sid()
        )
    }

    /// Query parameters selecting calls that ended inside `window`
    pub fn window_params(window: &TimeWindow) -> [(&'static str, String); 3] {
        [
            (
                "EndTime>",
                window.after.to_rfc3339_opts(SecondsFormat::Secs, true),
            ),
            (
                "EndTime<",
                window.before.to_rfc3339_opts(SecondsFormat::Secs, true),
            ),
            ("PageSize", PAGE_SIZE.to_string()),
        ]
    }

    /// Fetch one page. `next_page_uri` is `None` for the first page.
    async fn fetch_page(
        &self,
        next_page_uri: Option<String>,
        window: &TimeWindow,
    ) -> FetcherResult<CallsPage> {
        let request = match next_page_uri {
            // Next-page URIs already carry the filter and paging query
            Some(uri) => self.client.get(format!("{}{}", self.base_url, uri)),
            None => self
                .client
                .get(self.calls_url())
                .query(&Self::window_params(window)),
        };

        let started = Instant::now();
        let response = request
            .basic_auth(&self.credentials.account_sid, Some(&self.credentials.auth_token))
            .send()
            .await
            .map_err(|e| {
                metrics::record_page_request(None, started.elapsed());
                FetcherError::Network(e)
            })?;

        let status = response.status();
        metrics::record_page_request(Some(status.as_u16()), started.elapsed());

        let body = response.text().await?;
        if !status.is_success() {
            return Err(FetcherError::Http {
                status: status.as_u16(),
                body,
            });
        }

        debug!(
            status = status.as_u16(),
            bytes = body.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Calls page received"
        );

        parse_calls_page(&body)
    }
}

#[async_trait]
impl CallSource for TwilioHttpClient {
    async fn list_calls(&self, window: &TimeWindow) -> FetcherResult<Vec<RawRecord>> {
        collect_pages(|uri| self.fetch_page(uri, window)).await
    }

    fn endpoint(&self) -> String {
        self.calls_url()
    }
}
