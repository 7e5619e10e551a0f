//! Reminder queueing
//!
//! One score-ordered set per task type holds pending reminders. Delivery is
//! driven by the dispatcher in the infra layer through [`ports::NotificationChannel`].

pub mod ports;
pub mod queue;

pub use queue::NotificationQueue;
