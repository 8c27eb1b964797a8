//! Deposit recency check.
//!
//! A new deposit is due unless one was *created* within the trailing
//! interval. Completion and cancellation are ignored: a canceled or still
//! pending deposit inside the window suppresses a new one just the same.

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use crate::types::Transfer;

/// Default minimum spacing between deposits.
pub const DEFAULT_DEPOSIT_INTERVAL_DAYS: i64 = 15;

/// Longest interval the configuration accepts (about a century).
pub const MAX_DEPOSIT_INTERVAL_DAYS: i64 = 36_500;

pub fn default_interval() -> Duration {
    Duration::days(DEFAULT_DEPOSIT_INTERVAL_DAYS)
}

/// Whether a new deposit should be created now.
pub fn should_create_deposit(deposits: &[Transfer], interval: Duration) -> bool {
    should_create_deposit_at(deposits, interval, Utc::now())
}

/// Same as [`should_create_deposit`] with an explicit evaluation time.
///
/// Returns `false` iff some record has `created_at` in `[now - interval, now]`.
/// An interval reaching past the earliest representable time covers all
/// history.
pub fn should_create_deposit_at(
    deposits: &[Transfer],
    interval: Duration,
    now: DateTime<Utc>,
) -> bool {
    let window_start = now
        .checked_sub_signed(interval)
        .unwrap_or(DateTime::<Utc>::MIN_UTC);

    match deposits
        .iter()
        .find(|d| d.created_at >= window_start && d.created_at <= now)
    {
        Some(recent) => {
            debug!(
                transfer_id = %recent.id,
                created_at = %recent.created_at,
                canceled = recent.is_canceled(),
                completed = recent.is_completed(),
                "Recent deposit inside window"
            );
            false
        }
        None => true,
    }
}
