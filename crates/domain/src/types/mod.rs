//! Domain types and models

pub mod notification;
pub mod recommendation;
pub mod schedule;
pub mod task;

pub use notification::{Notification, NotificationMetadata};
pub use recommendation::{
    task_conditions, validate_recommendation_text, Conditions, ScheduleDocument,
};
pub use schedule::{ScheduleRequest, ScheduleResponse};
pub use task::{
    validate_preferred_time, Amount, AmountUnit, EnvironmentalFactors, Frequency,
    MaintenanceTask, TaskType,
};
