//! Testing utilities shared across the workspace.
//!
//! Only the time abstraction lives here; fixtures that depend on domain types
//! belong to the crate that owns those types.

pub mod time;

pub use time::{Clock, MockClock, SystemClock};
