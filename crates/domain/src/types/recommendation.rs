//! Recommendation provider contract types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::{MAX_RECOMMENDATION_CHARS, MIN_RECOMMENDATION_CHARS};
use crate::errors::{GardenwiseError, Result};
use crate::types::task::MaintenanceTask;

/// Free-form condition map sent to the provider.
///
/// A `BTreeMap` keeps key order stable so equal maps hash the same.
pub type Conditions = BTreeMap<String, Value>;

/// Structured care plan returned by the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleDocument {
    pub tasks: Vec<Value>,
    pub frequency: String,
    pub duration: String,
}

impl ScheduleDocument {
    /// Parse a provider payload, rejecting documents missing required fields.
    pub fn from_value(value: Value) -> Result<Self> {
        let object = value.as_object().ok_or_else(|| {
            GardenwiseError::AiServiceFailure("schedule document is not an object".into())
        })?;
        for field in ["tasks", "frequency", "duration"] {
            if !object.contains_key(field) {
                return Err(GardenwiseError::AiServiceFailure(format!(
                    "schedule document missing '{field}'"
                )));
            }
        }
        serde_json::from_value(value).map_err(|e| {
            GardenwiseError::AiServiceFailure(format!("malformed schedule document: {e}"))
        })
    }
}

/// Check that a recommendation is within the accepted length.
pub fn validate_recommendation_text(text: &str) -> Result<()> {
    let chars = text.trim().chars().count();
    if !(MIN_RECOMMENDATION_CHARS..=MAX_RECOMMENDATION_CHARS).contains(&chars) {
        return Err(GardenwiseError::AiServiceFailure(format!(
            "recommendation length {chars} outside {MIN_RECOMMENDATION_CHARS}..={MAX_RECOMMENDATION_CHARS}"
        )));
    }
    Ok(())
}

/// Subject line and condition map describing a task to the provider.
pub fn task_conditions(task: &MaintenanceTask) -> (String, Conditions) {
    let subject = format!("{} for crop {}", task.task_type, task.crop_id);

    let mut conditions = Conditions::new();
    conditions.insert("task_type".into(), Value::from(task.task_type.as_str()));
    conditions.insert("frequency".into(), Value::from(task.frequency.to_string()));
    conditions.insert("amount".into(), Value::from(task.amount.value));
    conditions.insert("unit".into(), Value::from(task.amount.unit.as_str()));
    conditions.insert(
        "preferred_time".into(),
        Value::from(task.preferred_time.format("%H:%M").to_string()),
    );
    if let Some(factors) = &task.environmental_factors {
        if let Some(temperature) = factors.temperature_c {
            conditions.insert("temperature_c".into(), Value::from(temperature));
        }
        if let Some(humidity) = factors.humidity_pct {
            conditions.insert("humidity_pct".into(), Value::from(humidity));
        }
        if let Some(light) = factors.light_level_lux {
            conditions.insert("light_level_lux".into(), Value::from(light));
        }
    }
    (subject, conditions)
}
