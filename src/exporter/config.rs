//! Export retry constants

use std::time::Duration;

/// Attempts per window before it is given up on, including the first.
pub const MAX_ATTEMPTS: u32 = 10;

/// Upper bound on the delay between two attempts when a backoff base is set.
pub const MAX_BACKOFF_MS: u64 = 30_000; // 30 seconds

/// Exponential backoff from `base`, capped at [`MAX_BACKOFF_MS`].
///
/// A zero base always yields zero, which is the default: failed windows are
/// retried immediately.
pub fn calculate_backoff(base: Duration, retry_count: u32) -> Duration {
    if base.is_zero() {
        return Duration::ZERO;
    }
    let factor = 2u32.saturating_pow(retry_count);
    base.saturating_mul(factor)
        .min(Duration::from_millis(MAX_BACKOFF_MS))
}
