//! Run configuration constants and backoff calculation

use std::time::Duration;

/// Maximum number of retries for transient request failures.
/// 5 retries with exponential backoff allows recovery from short outages
/// while avoiding infinite loops on persistent failures.
pub const MAX_RETRIES: u32 = 5;

/// Initial backoff delay in milliseconds.
/// 1 second is long enough for the provider's rate-limit window to recover
/// but short enough to not overly delay transient-error recovery.
pub const INITIAL_BACKOFF_MS: u64 = 1000;

/// Maximum backoff delay in milliseconds.
/// 30 seconds caps exponential backoff (retry 5 = 32s capped to 30s,
/// total max wait across 5 retries ~1 minute).
pub const MAX_BACKOFF_MS: u64 = 30_000;

/// Default minimum inter-request delay in milliseconds.
/// The provider limits requests per security token, not per zone pair, so
/// this budget is shared by all concurrent workers.
pub const DEFAULT_PACE_MS: u64 = 250;

/// Default maximum window span in days.
/// The provider rejects document requests spanning more than one year.
pub const DEFAULT_MAX_WINDOW_DAYS: i64 = 365;

/// Calculate exponential backoff delay
pub fn calculate_backoff(retry_count: u32) -> Duration {
    let delay_ms = INITIAL_BACKOFF_MS * 2u64.pow(retry_count);
    let delay_ms = delay_ms.min(MAX_BACKOFF_MS);
    Duration::from_millis(delay_ms)
}
