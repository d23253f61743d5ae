//! Retrying fetcher for a single time window
//!
//! Retries are strictly sequential. Once the attempt budget is spent the
//! window is reported as missed and an empty record set is returned, so one
//! bad window never aborts the export.

use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::exporter::config::{calculate_backoff, MAX_ATTEMPTS};
use crate::fetcher::retry_formatter::RetryContext;
use crate::fetcher::CallSource;
use crate::metrics;
use crate::{RawRecord, TimeWindow};

/// Retry budget for one window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    /// Base delay between attempts; zero retries immediately
    pub backoff_base: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: MAX_ATTEMPTS,
            backoff_base: Duration::ZERO,
        }
    }
}

impl RetryPolicy {
    /// Set the total number of attempts (at least 1)
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Set the base backoff delay
    pub fn with_backoff_base(mut self, backoff_base: Duration) -> Self {
        self.backoff_base = backoff_base;
        self
    }

    /// Delay before the attempt following `failed_attempt` (1-based)
    pub fn delay_after(&self, failed_attempt: u32) -> Duration {
        calculate_backoff(self.backoff_base, failed_attempt.saturating_sub(1))
    }
}

/// Result of fetching one window
#[derive(Debug, Clone, PartialEq)]
pub struct FetchOutcome {
    /// Records returned by the successful attempt, empty if missed
    pub records: Vec<RawRecord>,
    /// Attempts made
    pub attempts: u32,
    /// Whether every attempt failed
    pub missed: bool,
    /// Wall time spent on the window, retries included
    pub elapsed: Duration,
}

/// Fetches one window at a time from a [`CallSource`] with bounded retry
pub struct IntervalFetcher<S> {
    source: S,
    policy: RetryPolicy,
}

impl<S: CallSource> IntervalFetcher<S> {
    /// Create a fetcher over `source`
    pub fn new(source: S, policy: RetryPolicy) -> Self {
        Self { source, policy }
    }

    /// Retry policy in use
    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Fetch every record in `window`; never fails
    pub async fn fetch(&self, window: &TimeWindow) -> Vec<RawRecord> {
        self.fetch_with_outcome(window).await.records
    }

    /// Fetch `window` and report attempts and whether it was missed
    pub async fn fetch_with_outcome(&self, window: &TimeWindow) -> FetchOutcome {
        let started = Instant::now();
        let mut attempt = 1;

        loop {
            metrics::record_fetch_attempt(attempt);

            match self.source.list_calls(window).await {
                Ok(records) => {
                    if attempt > 1 {
                        info!(attempt, window = %window, "Retry succeeded");
                    }
                    return FetchOutcome {
                        records,
                        attempts: attempt,
                        missed: false,
                        elapsed: started.elapsed(),
                    };
                }
                Err(e) => {
                    let backoff = self.policy.delay_after(attempt);
                    let ctx = RetryContext::new(
                        attempt,
                        self.policy.max_attempts,
                        &e,
                        backoff,
                        *window,
                        self.source.endpoint(),
                    );

                    if attempt >= self.policy.max_attempts {
                        warn!("{}", ctx.format_failure());
                        metrics::record_window_missed();
                        return FetchOutcome {
                            records: Vec::new(),
                            attempts: attempt,
                            missed: true,
                            elapsed: started.elapsed(),
                        };
                    }

                    warn!(error = %e, "{}", ctx.format_retry());
                    metrics::record_retry(attempt, backoff);

                    if !backoff.is_zero() {
                        tokio::time::sleep(backoff).await;
                    }
                    attempt += 1;
                }
            }
        }
    }
}
