//! Configuration management

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    COMPOSTING_HOURLY_LIMIT, DEFAULT_HOURLY_LIMIT, DEFAULT_LEAD_TIME_SECS,
    DEFAULT_NOTIFICATION_MAX_RETRIES, DEFAULT_NOTIFICATION_RETRY_DELAY_SECS,
    DEFAULT_PAST_DUE_CLAMP_SECS, FERTILIZER_HOURLY_LIMIT, WATER_HOURLY_LIMIT,
};
use crate::errors::{GardenwiseError, Result};
use crate::types::TaskType;

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GardenwiseConfig {
    pub database: DatabaseConfig,
    pub scheduler: SchedulerConfig,
    pub dispatcher: DispatcherConfig,
    pub rate_limits: RateLimitConfig,
    pub recommendation: RecommendationConfig,
    pub notifications: NotificationChannelConfig,
}

impl GardenwiseConfig {
    /// Validate every section, returning the first problem found.
    pub fn validate(&self) -> Result<()> {
        self.database.validate()?;
        self.scheduler.validate()?;
        self.dispatcher.validate()?;
        self.rate_limits.validate()?;
        self.recommendation.validate()?;
        Ok(())
    }
}

/// Database configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: String,
    pub pool_size: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { path: "gardenwise.db".to_string(), pool_size: 8 }
    }
}

impl DatabaseConfig {
    pub fn validate(&self) -> Result<()> {
        if self.path.trim().is_empty() {
            return Err(GardenwiseError::Config("database.path must not be empty".into()));
        }
        if self.pool_size == 0 {
            return Err(GardenwiseError::Config("database.pool_size must be positive".into()));
        }
        Ok(())
    }
}

/// What the scheduler does when the recommendation provider is down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AiFailurePolicy {
    /// Schedule without AI input and flag the response as degraded.
    #[default]
    ProceedWithoutAi,
    /// Fail the whole create/update with `AiServiceFailure`.
    Fail,
}

/// Orchestrator configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Reminder fires this many seconds before the task is due.
    pub lead_time_secs: u64,
    /// Past-due reminders are pushed this far into the future.
    pub past_due_clamp_secs: u64,
    /// Deadline for every repository and shared-store call.
    pub store_timeout_ms: u64,
    /// Deadline for `generate_care_plan`.
    pub care_plan_timeout_ms: u64,
    /// Budget for the advisory recommendation call inside create/update.
    pub ai_budget_ms: u64,
    pub ai_failure_policy: AiFailurePolicy,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            lead_time_secs: DEFAULT_LEAD_TIME_SECS,
            past_due_clamp_secs: DEFAULT_PAST_DUE_CLAMP_SECS,
            store_timeout_ms: 2_000,
            care_plan_timeout_ms: 3_000,
            ai_budget_ms: 1_500,
            ai_failure_policy: AiFailurePolicy::default(),
        }
    }
}

impl SchedulerConfig {
    pub fn lead_time(&self) -> Duration {
        Duration::from_secs(self.lead_time_secs)
    }

    pub fn past_due_clamp(&self) -> Duration {
        Duration::from_secs(self.past_due_clamp_secs)
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }

    pub fn care_plan_timeout(&self) -> Duration {
        Duration::from_millis(self.care_plan_timeout_ms)
    }

    pub fn ai_budget(&self) -> Duration {
        Duration::from_millis(self.ai_budget_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.store_timeout_ms == 0 || self.care_plan_timeout_ms == 0 || self.ai_budget_ms == 0 {
            return Err(GardenwiseError::Config("scheduler timeouts must be positive".into()));
        }
        Ok(())
    }
}

/// Background delivery worker configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatcherConfig {
    pub workers: usize,
    pub tick_interval_secs: u64,
    pub max_retries: u32,
    pub retry_delay_secs: u64,
    /// Upper bound on notifications claimed per task type per tick.
    pub claim_batch_size: usize,
    pub delivery_timeout_ms: u64,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            workers: 5,
            tick_interval_secs: 60,
            max_retries: DEFAULT_NOTIFICATION_MAX_RETRIES,
            retry_delay_secs: DEFAULT_NOTIFICATION_RETRY_DELAY_SECS,
            claim_batch_size: 100,
            delivery_timeout_ms: 10_000,
        }
    }
}

impl DispatcherConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_interval_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }

    pub fn delivery_timeout(&self) -> Duration {
        Duration::from_millis(self.delivery_timeout_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(GardenwiseError::Config("dispatcher.workers must be positive".into()));
        }
        if self.tick_interval_secs == 0 {
            return Err(GardenwiseError::Config(
                "dispatcher.tick_interval_secs must be positive".into(),
            ));
        }
        if self.claim_batch_size == 0 {
            return Err(GardenwiseError::Config(
                "dispatcher.claim_batch_size must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// Hourly quotas per task type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    pub default_hourly: u64,
    /// Overrides keyed by task type identifier, e.g. `water`.
    pub per_task_type: BTreeMap<String, u64>,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        let per_task_type = BTreeMap::from([
            (TaskType::Water.as_str().to_string(), WATER_HOURLY_LIMIT),
            (TaskType::Fertilizer.as_str().to_string(), FERTILIZER_HOURLY_LIMIT),
            (TaskType::Composting.as_str().to_string(), COMPOSTING_HOURLY_LIMIT),
        ]);
        Self { default_hourly: DEFAULT_HOURLY_LIMIT, per_task_type }
    }
}

impl RateLimitConfig {
    /// Effective limit for a task type.
    pub fn limit_for(&self, task_type: TaskType) -> u64 {
        self.per_task_type.get(task_type.as_str()).copied().unwrap_or(self.default_hourly)
    }

    pub fn validate(&self) -> Result<()> {
        if self.default_hourly == 0 || self.per_task_type.values().any(|limit| *limit == 0) {
            return Err(GardenwiseError::Config("rate limits must be positive".into()));
        }
        for key in self.per_task_type.keys() {
            key.parse::<TaskType>().map_err(|_| {
                GardenwiseError::Config(format!("unknown task type '{key}' in rate_limits"))
            })?;
        }
        Ok(())
    }
}

/// External recommendation provider configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendationConfig {
    pub enabled: bool,
    pub endpoint: String,
    pub model: String,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub timeout_ms: u64,
    pub max_attempts: u32,
    pub base_backoff_ms: u64,
    pub max_jitter_ms: u64,
    /// Minimum spacing between outbound provider calls.
    pub min_call_interval_ms: u64,
    pub cache_ttl_secs: u64,
    pub cache_capacity: u64,
}

impl Default for RecommendationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key: None,
            timeout_ms: 4_000,
            max_attempts: 3,
            base_backoff_ms: 100,
            max_jitter_ms: 50,
            min_call_interval_ms: 1_000,
            cache_ttl_secs: 45 * 60,
            cache_capacity: 1_000,
        }
    }
}

impl RecommendationConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn base_backoff(&self) -> Duration {
        Duration::from_millis(self.base_backoff_ms)
    }

    pub fn max_jitter(&self) -> Duration {
        Duration::from_millis(self.max_jitter_ms)
    }

    pub fn min_call_interval(&self) -> Duration {
        Duration::from_millis(self.min_call_interval_ms)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            return Err(GardenwiseError::Config(
                "recommendation.max_attempts must be positive".into(),
            ));
        }
        if self.timeout_ms == 0 {
            return Err(GardenwiseError::Config(
                "recommendation.timeout_ms must be positive".into(),
            ));
        }
        if self.enabled && self.endpoint.trim().is_empty() {
            return Err(GardenwiseError::Config(
                "recommendation.endpoint is required when enabled".into(),
            ));
        }
        Ok(())
    }
}

/// Where delivered reminders go
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationChannelConfig {
    /// Webhook receiving reminder payloads; reminders are only logged when unset.
    pub webhook_url: Option<String>,
}
