//! Maintenance task model and the closed enums it is built from.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::{
    DAYLIGHT_END_SECS, DAYLIGHT_START_SECS, MAX_CUSTOM_DAYS, MAX_HUMIDITY_PCT, MAX_LIGHT_LUX,
    MAX_TEMPERATURE_C, MIN_CUSTOM_DAYS, MIN_HUMIDITY_PCT, MIN_LIGHT_LUX, MIN_TEMPERATURE_C,
};
use crate::errors::{GardenwiseError, Result};

/// Kind of garden care a task represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    Fertilizer,
    Water,
    Composting,
    Pruning,
    PestControl,
}

impl TaskType {
    /// Every task type, in queue-drain order.
    pub const ALL: [TaskType; 5] =
        [Self::Fertilizer, Self::Water, Self::Composting, Self::Pruning, Self::PestControl];

    /// Stable identifier used in store keys and persisted rows.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fertilizer => "fertilizer",
            Self::Water => "water",
            Self::Composting => "composting",
            Self::Pruning => "pruning",
            Self::PestControl => "pest_control",
        }
    }

    /// Unit amounts for this task type must be expressed in.
    pub fn canonical_unit(&self) -> AmountUnit {
        match self {
            Self::Water | Self::PestControl => AmountUnit::Milliliters,
            Self::Fertilizer | Self::Composting => AmountUnit::Grams,
            Self::Pruning => AmountUnit::Plants,
        }
    }

    /// Inclusive `(min, max)` bounds for the task amount.
    pub fn amount_bounds(&self) -> (f64, f64) {
        match self {
            Self::Water => (50.0, 2_000.0),
            Self::Fertilizer => (10.0, 500.0),
            Self::Composting => (100.0, 10_000.0),
            Self::Pruning => (1.0, 100.0),
            Self::PestControl => (5.0, 1_000.0),
        }
    }

    /// Reminder priority; higher is more urgent.
    pub fn notification_priority(&self) -> u8 {
        match self {
            Self::Water | Self::PestControl => 3,
            Self::Fertilizer => 2,
            Self::Pruning | Self::Composting => 1,
        }
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskType {
    type Err = GardenwiseError;

    fn from_str(value: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|task_type| task_type.as_str() == value)
            .ok_or_else(|| GardenwiseError::InvalidRequest(format!("unknown task type '{value}'")))
    }
}

/// How often a task recurs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "days", rename_all = "snake_case")]
pub enum Frequency {
    Daily,
    TwiceDaily,
    Weekly,
    BiWeekly,
    Monthly,
    /// Every N days, 1..=90.
    Custom(u16),
}

impl Frequency {
    /// Reject custom intervals outside 1..=90 days.
    pub fn validate(&self) -> Result<()> {
        if let Self::Custom(days) = self {
            if !(MIN_CUSTOM_DAYS..=MAX_CUSTOM_DAYS).contains(days) {
                return Err(GardenwiseError::InvalidRequest(format!(
                    "custom frequency must be between {MIN_CUSTOM_DAYS} and {MAX_CUSTOM_DAYS} days, got {days}"
                )));
            }
        }
        Ok(())
    }

    /// How many completions a perfectly kept schedule has in 30 days.
    pub fn expected_occurrences_in_30_days(&self) -> u32 {
        match self {
            Self::Daily => 30,
            Self::TwiceDaily => 60,
            Self::Weekly => 4,
            Self::BiWeekly => 2,
            Self::Monthly => 1,
            Self::Custom(days) => (30 / u32::from((*days).max(1))).max(1),
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Daily => f.write_str("daily"),
            Self::TwiceDaily => f.write_str("twice_daily"),
            Self::Weekly => f.write_str("weekly"),
            Self::BiWeekly => f.write_str("bi_weekly"),
            Self::Monthly => f.write_str("monthly"),
            Self::Custom(days) => write!(f, "custom:{days}"),
        }
    }
}

impl FromStr for Frequency {
    type Err = GardenwiseError;

    fn from_str(value: &str) -> Result<Self> {
        let frequency = match value {
            "daily" => Self::Daily,
            "twice_daily" => Self::TwiceDaily,
            "weekly" => Self::Weekly,
            "bi_weekly" => Self::BiWeekly,
            "monthly" => Self::Monthly,
            other => {
                let days = other
                    .strip_prefix("custom:")
                    .and_then(|days| days.parse::<u16>().ok())
                    .ok_or_else(|| {
                        GardenwiseError::InvalidRequest(format!("unknown frequency '{other}'"))
                    })?;
                Self::Custom(days)
            }
        };
        frequency.validate()?;
        Ok(frequency)
    }
}

/// Unit an [`Amount`] is measured in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmountUnit {
    Milliliters,
    Grams,
    Plants,
}

impl AmountUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Milliliters => "ml",
            Self::Grams => "g",
            Self::Plants => "plants",
        }
    }
}

impl FromStr for AmountUnit {
    type Err = GardenwiseError;

    fn from_str(value: &str) -> Result<Self> {
        match value {
            "ml" => Ok(Self::Milliliters),
            "g" => Ok(Self::Grams),
            "plants" => Ok(Self::Plants),
            other => Err(GardenwiseError::InvalidRequest(format!("unknown amount unit '{other}'"))),
        }
    }
}

/// Quantity applied per task occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Amount {
    pub value: f64,
    pub unit: AmountUnit,
}

impl Amount {
    pub fn new(value: f64, unit: AmountUnit) -> Self {
        Self { value, unit }
    }

    /// Check unit and bounds against the task type.
    pub fn validate_for(&self, task_type: TaskType) -> Result<()> {
        let expected_unit = task_type.canonical_unit();
        if self.unit != expected_unit {
            return Err(GardenwiseError::InvalidRequest(format!(
                "{task_type} amounts must be given in {}, got {}",
                expected_unit.as_str(),
                self.unit.as_str()
            )));
        }

        let (min, max) = task_type.amount_bounds();
        if !self.value.is_finite() || self.value < min || self.value > max {
            return Err(GardenwiseError::InvalidRequest(format!(
                "{task_type} amount must be between {min} and {max} {}, got {}",
                expected_unit.as_str(),
                self.value
            )));
        }
        Ok(())
    }
}

/// Conditions supplied with AI-recommended tasks.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EnvironmentalFactors {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature_c: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub humidity_pct: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub light_level_lux: Option<f64>,
}

impl EnvironmentalFactors {
    pub fn new(temperature_c: f64, humidity_pct: f64, light_level_lux: f64) -> Self {
        Self {
            temperature_c: Some(temperature_c),
            humidity_pct: Some(humidity_pct),
            light_level_lux: Some(light_level_lux),
        }
    }

    /// All three readings must be present, finite and within sane ranges.
    pub fn validate(&self) -> Result<()> {
        check_reading("temperature", self.temperature_c, MIN_TEMPERATURE_C, MAX_TEMPERATURE_C)?;
        check_reading("humidity", self.humidity_pct, MIN_HUMIDITY_PCT, MAX_HUMIDITY_PCT)?;
        check_reading("light level", self.light_level_lux, MIN_LIGHT_LUX, MAX_LIGHT_LUX)?;
        Ok(())
    }
}

fn check_reading(name: &str, reading: Option<f64>, min: f64, max: f64) -> Result<()> {
    let value = reading.ok_or_else(|| {
        GardenwiseError::InvalidRequest(format!(
            "{name} is required when the task is AI recommended"
        ))
    })?;
    if !value.is_finite() || value < min || value > max {
        return Err(GardenwiseError::InvalidRequest(format!(
            "{name} must be between {min} and {max}, got {value}"
        )));
    }
    Ok(())
}

/// Reject preferred times outside daylight hours (06:00 through 18:00).
pub fn validate_preferred_time(time: NaiveTime) -> Result<()> {
    let seconds = time.num_seconds_from_midnight();
    let past_end =
        seconds > DAYLIGHT_END_SECS || (seconds == DAYLIGHT_END_SECS && time.nanosecond() > 0);
    if seconds < DAYLIGHT_START_SECS || past_end {
        return Err(GardenwiseError::InvalidRequest(format!(
            "preferred time must be between 06:00 and 18:00, got {}",
            time.format("%H:%M")
        )));
    }
    Ok(())
}

/// A recurring garden-care task, persisted by the task repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaintenanceTask {
    pub id: Uuid,
    pub crop_id: String,
    pub task_type: TaskType,
    pub frequency: Frequency,
    pub amount: Amount,
    pub preferred_time: NaiveTime,
    pub ai_recommended: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environmental_factors: Option<EnvironmentalFactors>,
    pub next_scheduled_time: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_completed_time: Option<DateTime<Utc>>,
    pub completion_streak: u32,
    /// Percentage of expected completions achieved, 0..=100.
    pub completion_rate: f64,
    pub active: bool,
    #[serde(default)]
    pub ai_notes: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
