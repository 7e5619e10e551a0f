//! Resilience helpers for bounded retry loops.
//!
//! Retry loops in this workspace are written as explicit `for attempt in
//! 1..=max_attempts` iterations; this module only answers "how long do I wait
//! before the next attempt".

pub mod backoff;

pub use backoff::{ExponentialBackoff, Jitter};
