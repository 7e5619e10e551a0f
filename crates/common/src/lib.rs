//! Shared utilities for the Gardenwise crates.
//!
//! - [`time`]: wall-clock abstraction with a system and a mock implementation
//! - [`resilience`]: exponential backoff with jitter for bounded retry loops
//! - [`testing`]: deterministic helpers (mock clock) for unit and integration
//!   tests

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

pub mod resilience;
pub mod testing;
pub mod time;

pub use resilience::{ExponentialBackoff, Jitter};
pub use time::{Clock, MockClock, SystemClock};
