//! Call record fetchers

use crate::{RawRecord, TimeWindow};
use async_trait::async_trait;

pub mod interval;
pub mod pagination;
pub mod retry_formatter;
pub mod twilio_http;
pub mod twilio_parser;

pub use interval::{FetchOutcome, IntervalFetcher, RetryPolicy};

/// Fetcher errors
#[derive(Debug, thiserror::Error)]
pub enum FetcherError {
    /// Non-success HTTP status
    #[error("HTTP error {status}: {body}")]
    Http {
        /// Status code returned by the API
        status: u16,
        /// Response body, for diagnostics
        body: String,
    },

    /// Transport-level failure (connect, timeout, TLS)
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Response body could not be decoded
    #[error("parse error: {0}")]
    Parse(String),

    /// Page-follow loop did not terminate
    #[error("pagination error: {0}")]
    Pagination(String),

    /// Client could not be constructed
    #[error("client configuration error: {0}")]
    Configuration(String),
}

/// Result type for fetcher operations
pub type FetcherResult<T> = Result<T, FetcherError>;

/// Source of call records for a single time window
///
/// Implementations return every record in the window, following all pages.
/// A failure anywhere in the page chain fails the whole call so the
/// [`IntervalFetcher`] can retry the window from the start.
#[async_trait]
pub trait CallSource: Send + Sync {
    /// List all calls whose end time falls inside `window`
    async fn list_calls(&self, window: &TimeWindow) -> FetcherResult<Vec<RawRecord>>;

    /// Human-readable endpoint description used in logs
    fn endpoint(&self) -> String;
}

#[async_trait]
impl<S: CallSource + ?Sized> CallSource for &S {
    async fn list_calls(&self, window: &TimeWindow) -> FetcherResult<Vec<RawRecord>> {
        (**self).list_calls(window).await
    }

    fn endpoint(&self) -> String {
        (**self).endpoint()
    }
}
