//! Background delivery of queued reminders.

pub mod error;
pub mod notification_dispatcher;

pub use error::{DispatcherError, DispatcherResult};
pub use notification_dispatcher::{DispatchSummary, NotificationDispatcher};
