//! Page-following for the Calls list resource
//!
//! Twilio pages are linked through `next_page_uri`. The helper keeps
//! requesting until that link is absent, with an iteration cap so a
//! misbehaving server cannot loop forever.

use crate::fetcher::twilio_parser::{normalize_page, CallsPage};
use crate::fetcher::{FetcherError, FetcherResult};
use crate::RawRecord;
use std::future::Future;
use tracing::debug;

/// Maximum number of pages followed for a single window
pub const MAX_PAGES: usize = 10_000;

/// Page size requested from the API
pub const PAGE_SIZE: usize = 1000;

/// Collect every record across the page chain.
///
/// `fetch_page` receives `None` for the first page and `Some(next_page_uri)`
/// for each following page. Any page error aborts the whole collection.
pub async fn collect_pages<F, Fut>(mut fetch_page: F) -> FetcherResult<Vec<RawRecord>>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = FetcherResult<CallsPage>>,
{
    let mut records = Vec::new();
    let mut next_uri: Option<String> = None;
    let mut iteration = 0;

    loop {
        if iteration >= MAX_PAGES {
            return Err(FetcherError::Pagination(format!(
                "Max pages ({MAX_PAGES}) exceeded - possible loop. Last page URI: {next_uri:?}"
            )));
        }

        let page = fetch_page(next_uri.take()).await?;
        let following = page.next_page_uri.clone().filter(|uri| !uri.is_empty());

        debug!(
            page = page.page,
            calls = page.calls.len(),
            has_next = following.is_some(),
            "Received calls page"
        );

        records.extend(normalize_page(page));
        iteration += 1;

        match following {
            Some(uri) => next_uri = Some(uri),
            None => break,
        }
    }

    debug!(
        pages = iteration,
        calls = records.len(),
        "Pagination completed"
    );

    Ok(records)
}
