//! # Gardenwise Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - The schedule calculator (next-due and completion bookkeeping)
//! - The hourly rate limiter and notification queue, both built on the
//!   [`SharedStore`] port
//! - The [`MaintenanceScheduler`] orchestrator
//! - Port/adapter interfaces (traits)
//!
//! ## Architecture Principles
//! - Only depends on `gardenwise-common` and `gardenwise-domain`
//! - No database, HTTP, or platform code
//! - All external dependencies via traits
//! - Every external call is bounded by a deadline

pub mod deadline;
pub mod notifications;
pub mod rate_limit;
pub mod scheduling;

// Infrastructure ports
pub mod metrics_ports;
pub mod shared_store_ports;

pub use metrics_ports::{MetricsRecorder, NoopMetrics};
pub use notifications::ports::NotificationChannel;
pub use notifications::NotificationQueue;
pub use rate_limit::RateLimiter;
pub use scheduling::ports::{RecommendationService, TaskRepository};
pub use scheduling::{MaintenanceScheduler, ScheduleCalculator};
pub use shared_store_ports::SharedStore;
