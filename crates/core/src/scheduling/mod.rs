//! Maintenance task scheduling
//!
//! [`ScheduleCalculator`] does the date arithmetic; [`MaintenanceScheduler`]
//! ties it to persistence, quotas, recommendations and the reminder queue.

pub mod calculator;
pub mod ports;
pub mod service;

pub use calculator::{CompletionStats, DueInputs, ScheduleCalculator};
pub use service::MaintenanceScheduler;
