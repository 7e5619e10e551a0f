//! Next-due computation and completion bookkeeping.
//!
//! Everything here is pure: the current instant is always passed in.

use chrono::{DateTime, Months, NaiveTime, TimeDelta, Utc};
use gardenwise_domain::constants::{
    HOT_WEATHER_ADVANCE_HOURS, HOT_WEATHER_THRESHOLD_C, MAX_COMPLETION_RATE,
};
use gardenwise_domain::{
    validate_preferred_time, EnvironmentalFactors, Frequency, GardenwiseError, MaintenanceTask,
    Result, ScheduleRequest, TaskType,
};

/// The fields `next_scheduled_time` is derived from.
#[derive(Debug, Clone, Copy)]
pub struct DueInputs<'a> {
    pub task_type: TaskType,
    pub frequency: Frequency,
    pub preferred_time: NaiveTime,
    pub last_completed: Option<DateTime<Utc>>,
    pub ai_recommended: bool,
    pub environmental_factors: Option<&'a EnvironmentalFactors>,
}

impl<'a> DueInputs<'a> {
    pub fn from_task(task: &'a MaintenanceTask) -> Self {
        Self {
            task_type: task.task_type,
            frequency: task.frequency,
            preferred_time: task.preferred_time,
            last_completed: task.last_completed_time,
            ai_recommended: task.ai_recommended,
            environmental_factors: task.environmental_factors.as_ref(),
        }
    }

    pub fn from_request(
        request: &'a ScheduleRequest,
        last_completed: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            task_type: request.task_type,
            frequency: request.frequency,
            preferred_time: request.preferred_time,
            last_completed,
            ai_recommended: request.ai_recommended,
            environmental_factors: request.environmental_factors.as_ref(),
        }
    }
}

/// Streak and rate after recording a completion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompletionStats {
    pub streak: u32,
    pub rate: f64,
}

/// Stateless schedule arithmetic.
#[derive(Debug, Default, Clone, Copy)]
pub struct ScheduleCalculator;

impl ScheduleCalculator {
    /// When the task is next due.
    ///
    /// With a previous completion the baseline is that day at the preferred
    /// time, shifted by one frequency interval. Without one the task is due
    /// at the next occurrence of the preferred time at or after `now`.
    pub fn next_due(inputs: &DueInputs<'_>, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
        inputs.frequency.validate()?;
        validate_preferred_time(inputs.preferred_time)?;
        if inputs.ai_recommended {
            inputs
                .environmental_factors
                .ok_or_else(|| {
                    GardenwiseError::InvalidRequest(
                        "environmental factors are required when the task is AI recommended"
                            .into(),
                    )
                })?
                .validate()?;
        }

        let due = match inputs.last_completed {
            Some(last) => {
                let baseline = last.date_naive().and_time(inputs.preferred_time).and_utc();
                Self::advance(baseline, inputs.frequency)?
            }
            None => {
                let today = now.date_naive().and_time(inputs.preferred_time).and_utc();
                if today >= now {
                    today
                } else {
                    today + TimeDelta::days(1)
                }
            }
        };

        Ok(Self::apply_environment(inputs, due))
    }

    /// Shift `from` by one interval of `frequency`.
    pub fn advance(from: DateTime<Utc>, frequency: Frequency) -> Result<DateTime<Utc>> {
        let shifted = match frequency {
            Frequency::Daily => from.checked_add_signed(TimeDelta::hours(24)),
            Frequency::TwiceDaily => from.checked_add_signed(TimeDelta::hours(12)),
            Frequency::Weekly => from.checked_add_signed(TimeDelta::days(7)),
            Frequency::BiWeekly => from.checked_add_signed(TimeDelta::days(14)),
            Frequency::Monthly => from.checked_add_months(Months::new(1)),
            Frequency::Custom(days) => {
                frequency.validate()?;
                from.checked_add_signed(TimeDelta::days(i64::from(days)))
            }
        };
        shifted.ok_or_else(|| {
            GardenwiseError::InvalidRequest(format!("{frequency} offset from {from} overflows"))
        })
    }

    /// Hot-weather watering moves earlier; no other factor changes the time.
    fn apply_environment(inputs: &DueInputs<'_>, due: DateTime<Utc>) -> DateTime<Utc> {
        let hot = inputs
            .environmental_factors
            .and_then(|factors| factors.temperature_c)
            .is_some_and(|temperature| temperature > HOT_WEATHER_THRESHOLD_C);

        if inputs.ai_recommended && inputs.task_type == TaskType::Water && hot {
            due - TimeDelta::hours(HOT_WEATHER_ADVANCE_HOURS)
        } else {
            due
        }
    }

    /// Streak and rate for a completion at `completed_at`.
    ///
    /// A completion within one frequency interval of the previous one extends
    /// the streak; a late one (or the first ever) starts it again at 1.
    pub fn record_completion(
        task: &MaintenanceTask,
        completed_at: DateTime<Utc>,
    ) -> Result<CompletionStats> {
        let streak = match task.last_completed_time {
            Some(last) => {
                let expected = Self::advance(last, task.frequency)? - last;
                if completed_at - last <= expected {
                    task.completion_streak.saturating_add(1)
                } else {
                    1
                }
            }
            None => 1,
        };

        Ok(CompletionStats { streak, rate: Self::completion_rate(streak, task.frequency) })
    }

    /// `min(100, streak / expected_occurrences * 100)`.
    pub fn completion_rate(streak: u32, frequency: Frequency) -> f64 {
        let expected = f64::from(frequency.expected_occurrences_in_30_days());
        (f64::from(streak) / expected * 100.0).min(MAX_COMPLETION_RATE)
    }
}
