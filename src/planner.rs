//! Window planning
//!
//! The Calls API caps each page at 1000 records, so the requested range is
//! split into narrow fixed-width windows. A failed window only costs a refetch
//! of that slice.

use crate::TimeWindow;
use chrono::{DateTime, Duration, Utc};
use tracing::debug;

/// Default window width in minutes
pub const DEFAULT_WINDOW_MINUTES: i64 = 5;

/// Default window width
pub fn default_window_width() -> Duration {
    Duration::minutes(DEFAULT_WINDOW_MINUTES)
}

/// Split `[start, end)` into contiguous windows of `width`.
///
/// The last window is not clamped, so its `before` may overshoot `end` by less
/// than one width. Returns an empty plan when `start >= end` or `width` is not
/// positive.
pub fn plan_windows(start: DateTime<Utc>, end: DateTime<Utc>, width: Duration) -> Vec<TimeWindow> {
    if width <= Duration::zero() {
        return Vec::new();
    }

    let mut windows = Vec::new();
    let mut cursor = start;

    while cursor < end {
        let next = cursor + width;
        windows.push(TimeWindow {
            after: cursor,
            before: next,
        });
        cursor = next;
    }

    debug!(
        windows = windows.len(),
        width_secs = width.num_seconds(),
        "Planned export windows"
    );

    windows
}
