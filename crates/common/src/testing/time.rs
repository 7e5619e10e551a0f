//! Time abstraction for testability
//!
//! Provides a trait-based approach to wall-clock reads that allows for
//! deterministic testing without relying on actual time passage.
//!
//! # Examples
//!
//! ```
//! use std::time::Duration;
//!
//! use chrono::{TimeZone, Utc};
//! use gardenwise_common::testing::{Clock, MockClock};
//!
//! let start = Utc.with_ymd_and_hms(2025, 6, 1, 5, 0, 0).unwrap();
//! let clock = MockClock::at(start);
//! clock.advance(Duration::from_secs(90 * 60));
//! assert_eq!(clock.now(), Utc.with_ymd_and_hms(2025, 6, 1, 6, 30, 0).unwrap());
//! ```

// Allow missing panics docs for the mock clock - a poisoned mutex in a test
// utility should fail the test immediately
#![allow(clippy::missing_panics_doc)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};

/// Trait for wall-clock reads
///
/// Everything that compares against "now" (due times, hourly buckets, queue
/// scores) takes a `Clock` so production code uses [`SystemClock`] and tests
/// use [`MockClock`].
pub trait Clock: Send + Sync {
    /// Current wall-clock time in UTC.
    fn now(&self) -> DateTime<Utc>;

    /// Milliseconds since the UNIX epoch.
    fn millis_since_epoch(&self) -> i64 {
        self.now().timestamp_millis()
    }
}

/// Real system clock implementation
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Mock clock for deterministic testing
///
/// Clones share the same underlying instant, so a clock handed to a service
/// can be advanced from the test body.
#[derive(Debug, Clone)]
pub struct MockClock {
    current: Arc<Mutex<DateTime<Utc>>>,
}

impl MockClock {
    /// Create a mock clock frozen at the current real time.
    pub fn new() -> Self {
        Self::at(Utc::now())
    }

    /// Create a mock clock frozen at `instant`.
    pub fn at(instant: DateTime<Utc>) -> Self {
        Self { current: Arc::new(Mutex::new(instant)) }
    }

    /// Advance the clock by a std duration.
    pub fn advance(&self, duration: Duration) {
        let delta = TimeDelta::from_std(duration).unwrap_or(TimeDelta::MAX);
        self.advance_by(delta);
    }

    /// Advance (or rewind, for negative deltas) the clock by a chrono delta.
    pub fn advance_by(&self, delta: TimeDelta) {
        let mut current = self.current.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *current += delta;
    }

    /// Jump to an absolute instant.
    pub fn set(&self, instant: DateTime<Utc>) {
        let mut current = self.current.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *current = instant;
    }
}

impl Default for MockClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MockClock {
    fn now(&self) -> DateTime<Utc> {
        *self.current.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
