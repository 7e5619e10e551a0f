//! Observability infrastructure for metrics and logging
//!
//! - [`metrics::SchedulerMetrics`]: scheduler/dispatcher counters plus AI
//!   call latency percentiles (P50/P95/P99), implementing the core
//!   `MetricsRecorder` port
//! - [`logging::init_tracing`]: process-wide `tracing` subscriber
//!
//! ## Design Principles
//!
//! 1. **Poison Recovery**: All mutex locks use explicit poison recovery
//!    (`match lock() { Ok(g) => g, Err(p) => p.into_inner() }`) and log a
//!    warning.
//!
//! 2. **Future-Proof Returns**: All record methods return `MetricsResult<()>`
//!    but currently always succeed.
//!
//! 3. **Ring Buffers**: VecDeque for O(1) eviction (not Vec with remove(0))

pub mod logging;
pub mod metrics;

/// Metrics error type
///
/// Record methods return `MetricsResult<()>` and currently always succeed;
/// aggregate reads fail on an empty sample set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MetricsError {
    /// Empty data set - cannot calculate aggregate metric
    #[error("Empty data: cannot calculate {metric}")]
    EmptyData {
        /// Metric name that failed (e.g., "P95", "P50")
        metric: &'static str,
    },
}

/// Result type for metrics operations
pub type MetricsResult<T> = Result<T, MetricsError>;
