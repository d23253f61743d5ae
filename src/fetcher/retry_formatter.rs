//! Retry message formatting for the interval fetcher.
//!
//! Classifies fetch failures so retry and missed-window log lines carry a
//! readable description and, on exhaustion, an actionable suggestion.

use crate::fetcher::FetcherError;
use crate::TimeWindow;
use std::time::Duration;

/// Classification of fetch errors for user messaging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryErrorType {
    /// Request timed out
    NetworkTimeout,
    /// Connection refused, DNS failure, or other offline scenarios
    NetworkOffline,
    /// HTTP 429 too many requests
    RateLimit,
    /// HTTP 5xx server error
    ServerError(u16),
    /// Authentication failures (401/403)
    AuthFailed(u16),
    /// Other client errors (4xx, except 429)
    ClientError(u16),
    /// Response body could not be decoded
    ParseFailure,
    /// Generic fallback when no better classification fits
    NetworkGeneric,
}

impl RetryErrorType {
    /// Classify a fetcher error.
    pub fn from_error(err: &FetcherError) -> Self {
        match err {
            FetcherError::Http { status, .. } => Self::from_status(*status),
            FetcherError::Network(e) if e.is_timeout() => Self::NetworkTimeout,
            FetcherError::Network(e) if e.is_connect() => Self::NetworkOffline,
            FetcherError::Network(e) => match e.status() {
                Some(status) => Self::from_status(status.as_u16()),
                None => Self::NetworkGeneric,
            },
            FetcherError::Parse(_) => Self::ParseFailure,
            FetcherError::Pagination(_) | FetcherError::Configuration(_) => Self::NetworkGeneric,
        }
    }

    /// Classify an HTTP status code.
    pub fn from_status(status: u16) -> Self {
        match status {
            401 | 403 => Self::AuthFailed(status),
            429 => Self::RateLimit,
            500..=599 => Self::ServerError(status),
            400..=499 => Self::ClientError(status),
            _ => Self::NetworkGeneric,
        }
    }

    /// User-friendly description used inside retry log messages.
    pub fn description(&self) -> &'static str {
        match self {
            Self::NetworkTimeout => "network timeout",
            Self::NetworkOffline => "connection failed",
            Self::RateLimit => "too many requests",
            Self::ServerError(code) => match code {
                500 => "internal server error",
                502 => "bad gateway",
                503 => "service unavailable",
                504 => "gateway timeout",
                _ => "server error",
            },
            Self::AuthFailed(_) => "authentication failed",
            Self::ClientError(code) => match code {
                404 => "resource not found",
                _ => "client error",
            },
            Self::ParseFailure => "unreadable response",
            Self::NetworkGeneric => "network error",
        }
    }

    /// Suggested remediation shown once a window is given up on.
    pub fn suggestion(&self) -> &'static str {
        match self {
            Self::NetworkTimeout => "Check your network connection and firewall settings",
            Self::NetworkOffline => "Verify internet connectivity and DNS resolution",
            Self::RateLimit => "Set --retry-backoff-ms to space out retries",
            Self::ServerError(_) => "Twilio may be degraded, check https://status.twilio.com",
            Self::AuthFailed(_) => "Verify TWILIO_ACCOUNT_SID and TWILIO_AUTH_TOKEN",
            Self::ClientError(_) => "Check the account SID and TWILIO_API_BASE",
            Self::ParseFailure => "Check that TWILIO_API_BASE points at the REST API",
            Self::NetworkGeneric => "Check network connectivity and try again",
        }
    }
}

/// Context for formatting retry messages.
#[derive(Debug, Clone)]
pub struct RetryContext {
    /// Attempt that just failed (1-based)
    pub attempt: u32,
    /// Maximum number of attempts configured
    pub max_attempts: u32,
    /// Type of error that triggered the retry
    pub error_type: RetryErrorType,
    /// Delay before the next attempt
    pub backoff_duration: Duration,
    /// Window being fetched
    pub window: TimeWindow,
    /// Error message of the failed attempt
    pub error_message: String,
    /// Endpoint that failed
    pub endpoint: String,
}

impl RetryContext {
    /// Build a context from the error of a failed attempt.
    pub fn new(
        attempt: u32,
        max_attempts: u32,
        error: &FetcherError,
        backoff_duration: Duration,
        window: TimeWindow,
        endpoint: impl Into<String>,
    ) -> Self {
        Self {
            attempt,
            max_attempts,
            error_type: RetryErrorType::from_error(error),
            backoff_duration,
            window,
            error_message: error.to_string(),
            endpoint: endpoint.into(),
        }
    }

    /// Message logged before the next attempt.
    pub fn format_retry(&self) -> String {
        let mut message = format!(
            "Error retrieving calls ({}). Retrying, attempt {}/{}",
            self.error_type.description(),
            self.attempt + 1,
            self.max_attempts,
        );
        if !self.backoff_duration.is_zero() {
            message.push_str(&format!(
                " in {:.1} seconds",
                self.backoff_duration.as_secs_f64()
            ));
        }
        message.push(' ');
        message.push_str(&self.window.to_string());
        message
    }

    /// Multi-line summary logged when the window is given up on.
    pub fn format_failure(&self) -> String {
        [
            format!(
                "Retry attempts exceeded. Interval missed after {} attempts",
                self.max_attempts
            ),
            format!("  Window: {}", self.window),
            format!("  Last error: {}", self.error_message),
            format!("  Endpoint: {}", self.endpoint),
            format!("  Suggestion: {}", self.error_type.suggestion()),
        ]
        .join("\n")
    }
}
