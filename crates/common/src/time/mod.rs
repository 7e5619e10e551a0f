//! Time utilities and abstractions
//!
//! Scheduling math is done against [`Clock::now`] rather than `Utc::now()` so
//! that due-time calculations, hourly rate-limit buckets and queue scores can
//! be driven deterministically in tests.

use chrono::{DateTime, Utc};

// Re-export Clock abstractions from testing module
pub use crate::testing::time::{Clock, MockClock, SystemClock};

/// Seconds in one rate-limit bucket.
pub const SECONDS_PER_HOUR: i64 = 3_600;

/// Index of the wall-clock hour containing `at` (hours since the UNIX epoch).
pub fn hour_bucket(at: DateTime<Utc>) -> i64 {
    at.timestamp().div_euclid(SECONDS_PER_HOUR)
}
