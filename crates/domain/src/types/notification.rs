//! Reminder records held in the notification queue.

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::task::{Frequency, TaskType};
use crate::errors::{GardenwiseError, Result};

/// Context carried alongside a reminder for the delivery channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationMetadata {
    pub crop_id: String,
    pub frequency: Frequency,
    pub preferred_time: NaiveTime,
}

/// A queued reminder for one occurrence of a maintenance task.
///
/// Lives only in the shared store; it is never written to the task database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub task_id: Uuid,
    pub task_type: TaskType,
    pub scheduled_time: DateTime<Utc>,
    pub priority: u8,
    pub retry_count: u32,
    pub correlation_id: Uuid,
    pub metadata: NotificationMetadata,
}

impl Notification {
    /// Ordering key in the per-task-type set.
    pub fn score(&self) -> i64 {
        self.scheduled_time.timestamp()
    }

    /// Serialized form stored as an ordered-set member.
    pub fn to_member(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| GardenwiseError::Internal(format!("failed to encode notification: {e}")))
    }

    pub fn from_member(member: &str) -> Result<Self> {
        serde_json::from_str(member)
            .map_err(|e| GardenwiseError::Internal(format!("failed to decode notification: {e}")))
    }
}
