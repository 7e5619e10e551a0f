//! Request and response shapes for the scheduling operations.

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use super::task::{
    validate_preferred_time, Amount, EnvironmentalFactors, Frequency, MaintenanceTask, TaskType,
};
use crate::errors::{GardenwiseError, Result};

fn default_active() -> bool {
    true
}

/// Input for creating or updating a maintenance schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleRequest {
    pub crop_id: String,
    pub task_type: TaskType,
    pub frequency: Frequency,
    pub amount: Amount,
    pub preferred_time: NaiveTime,
    #[serde(default)]
    pub ai_recommended: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environmental_factors: Option<EnvironmentalFactors>,
    #[serde(default = "default_active")]
    pub active: bool,
}

impl ScheduleRequest {
    /// Field-level validation. Every failure is `InvalidRequest`.
    pub fn validate(&self) -> Result<()> {
        if self.crop_id.trim().is_empty() {
            return Err(GardenwiseError::InvalidRequest("crop_id must not be empty".into()));
        }
        self.frequency.validate()?;
        self.amount.validate_for(self.task_type)?;
        validate_preferred_time(self.preferred_time)?;

        if self.ai_recommended {
            match &self.environmental_factors {
                Some(factors) => factors.validate()?,
                None => {
                    return Err(GardenwiseError::InvalidRequest(
                        "environmental factors are required when the task is AI recommended"
                            .into(),
                    ))
                }
            }
        }
        Ok(())
    }
}

/// Result of every scheduling operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleResponse {
    pub task: MaintenanceTask,
    /// When the reminder for `task.next_scheduled_time` will fire, if one was queued.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_notification_at: Option<DateTime<Utc>>,
    /// Advisory notes fetched for this call; empty when AI was not consulted.
    #[serde(default)]
    pub recommendations: Vec<String>,
    /// True when the recommendation provider failed and the task was scheduled without it.
    #[serde(default)]
    pub degraded: bool,
}

impl ScheduleResponse {
    pub fn for_task(task: MaintenanceTask) -> Self {
        Self { task, next_notification_at: None, recommendations: Vec::new(), degraded: false }
    }
}
