//! Metrics collection modules
//!
//! Thread-safe metrics for the scheduler, dispatcher and recommendation
//! client.

pub mod ai;
pub mod scheduler;

// Re-export metric types for convenience
pub use ai::AiCallMetrics;
pub use scheduler::{MetricsSnapshot, SchedulerMetrics};
