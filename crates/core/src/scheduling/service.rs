//! Maintenance scheduling service - core business logic

use std::sync::Arc;

use chrono::{DateTime, Utc};
use gardenwise_common::Clock;
use gardenwise_domain::{
    task_conditions, AiFailurePolicy, Conditions, GardenwiseError, MaintenanceTask, Result,
    ScheduleDocument, ScheduleRequest, ScheduleResponse, SchedulerConfig, TaskType,
};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::calculator::{DueInputs, ScheduleCalculator};
use super::ports::{RecommendationService, TaskRepository};
use crate::deadline::with_deadline;
use crate::metrics_ports::{MetricsRecorder, NoopMetrics};
use crate::notifications::NotificationQueue;
use crate::rate_limit::RateLimiter;

/// Advisory output of a recommendation call made during create/update.
#[derive(Debug, Default)]
struct AiOutcome {
    /// `None` when the provider was not consulted.
    notes: Option<Vec<String>>,
    degraded: bool,
}

/// Orchestrates create/update/complete/get on maintenance tasks.
///
/// Each mutating operation persists the task and then replaces its queued
/// reminder. The dispatcher is never awaited on this path.
pub struct MaintenanceScheduler {
    repository: Arc<dyn TaskRepository>,
    rate_limiter: RateLimiter,
    queue: NotificationQueue,
    clock: Arc<dyn Clock>,
    metrics: Arc<dyn MetricsRecorder>,
    recommendations: Option<Arc<dyn RecommendationService>>,
    config: SchedulerConfig,
}

impl MaintenanceScheduler {
    /// Create a scheduler without a recommendation provider or metrics sink
    pub fn new(
        repository: Arc<dyn TaskRepository>,
        rate_limiter: RateLimiter,
        queue: NotificationQueue,
        clock: Arc<dyn Clock>,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            repository,
            rate_limiter,
            queue,
            clock,
            metrics: Arc::new(NoopMetrics),
            recommendations: None,
            config,
        }
    }

    /// Consult this provider for AI-recommended tasks and care plans
    pub fn with_recommendations(mut self, service: Arc<dyn RecommendationService>) -> Self {
        self.recommendations = Some(service);
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<dyn MetricsRecorder>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Validate, rate-limit, schedule, persist and queue a new task.
    #[instrument(
        skip(self, request),
        fields(task_type = %request.task_type, crop_id = %request.crop_id)
    )]
    pub async fn create_schedule(&self, request: ScheduleRequest) -> Result<ScheduleResponse> {
        request.validate()?;
        self.rate_limiter.check_and_increment(request.task_type).await?;

        let now = self.clock.now();
        let next = ScheduleCalculator::next_due(&DueInputs::from_request(&request, None), now)?;

        let mut task = MaintenanceTask {
            id: Uuid::now_v7(),
            crop_id: request.crop_id,
            task_type: request.task_type,
            frequency: request.frequency,
            amount: request.amount,
            preferred_time: request.preferred_time,
            ai_recommended: request.ai_recommended,
            environmental_factors: request.environmental_factors,
            next_scheduled_time: next,
            last_completed_time: None,
            completion_streak: 0,
            completion_rate: 0.0,
            active: request.active,
            ai_notes: Vec::new(),
            created_at: now,
            updated_at: now,
        };

        let ai = self.consult_ai(&task).await?;
        if let Some(notes) = &ai.notes {
            task.ai_notes = notes.clone();
        }

        with_deadline(self.config.store_timeout(), "task create", self.repository.create(&task))
            .await?;

        let next_notification_at = self.queue_reminder(&task).await?;
        info!(
            task_id = %task.id,
            next_due = %task.next_scheduled_time,
            "Maintenance schedule created"
        );

        Ok(ScheduleResponse {
            task,
            next_notification_at,
            recommendations: ai.notes.unwrap_or_default(),
            degraded: ai.degraded,
        })
    }

    /// Replace a task's settings, keeping its completion history.
    #[instrument(skip(self, request), fields(task_type = %request.task_type))]
    pub async fn update_schedule(
        &self,
        id: Uuid,
        request: ScheduleRequest,
    ) -> Result<ScheduleResponse> {
        request.validate()?;
        let existing = self.load(id).await?;
        self.rate_limiter.check_and_increment(request.task_type).await?;

        let now = self.clock.now();
        let next = ScheduleCalculator::next_due(
            &DueInputs::from_request(&request, existing.last_completed_time),
            now,
        )?;

        let previous_type = existing.task_type;
        let mut task = MaintenanceTask {
            crop_id: request.crop_id,
            task_type: request.task_type,
            frequency: request.frequency,
            amount: request.amount,
            preferred_time: request.preferred_time,
            ai_recommended: request.ai_recommended,
            environmental_factors: request.environmental_factors,
            next_scheduled_time: next,
            active: request.active,
            updated_at: now,
            ..existing
        };

        let ai = self.consult_ai(&task).await?;
        if !task.ai_recommended {
            task.ai_notes.clear();
        } else if let Some(notes) = &ai.notes {
            task.ai_notes = notes.clone();
        }

        with_deadline(self.config.store_timeout(), "task save", self.repository.save(&task)).await?;

        self.queue.cancel_for_task(previous_type, task.id).await?;
        let next_notification_at = self.queue_reminder(&task).await?;
        info!(task_id = %task.id, active = task.active, "Maintenance schedule updated");

        Ok(ScheduleResponse {
            task,
            next_notification_at,
            recommendations: ai.notes.unwrap_or_default(),
            degraded: ai.degraded,
        })
    }

    /// Record a completion now and schedule the following occurrence.
    #[instrument(skip(self))]
    pub async fn complete_task(&self, id: Uuid) -> Result<ScheduleResponse> {
        let mut task = self.load(id).await?;
        if !task.active {
            return Err(GardenwiseError::InvalidRequest(format!(
                "task {id} is inactive and cannot be completed"
            )));
        }

        let now = self.clock.now();
        let stats = ScheduleCalculator::record_completion(&task, now)?;
        task.last_completed_time = Some(now);
        task.completion_streak = stats.streak;
        task.completion_rate = stats.rate;
        let next = ScheduleCalculator::next_due(&DueInputs::from_task(&task), now)?;
        task.next_scheduled_time = next;
        task.updated_at = now;

        with_deadline(self.config.store_timeout(), "task save", self.repository.save(&task)).await?;

        self.queue.cancel_for_task(task.task_type, task.id).await?;
        let next_notification_at = self.queue_reminder(&task).await?;
        info!(
            task_id = %task.id,
            streak = task.completion_streak,
            next_due = %task.next_scheduled_time,
            "Maintenance task completed"
        );

        Ok(ScheduleResponse { next_notification_at, ..ScheduleResponse::for_task(task) })
    }

    /// Current state of a task.
    pub async fn get_schedule(&self, id: Uuid) -> Result<ScheduleResponse> {
        let task = self.load(id).await?;
        Ok(ScheduleResponse::for_task(task))
    }

    /// Ask the provider for a structured plan covering `subjects`.
    #[instrument(skip(self, subjects, conditions), fields(subject_count = subjects.len()))]
    pub async fn generate_care_plan(
        &self,
        subjects: &[String],
        conditions: &Conditions,
    ) -> Result<ScheduleDocument> {
        if subjects.is_empty() {
            return Err(GardenwiseError::InvalidRequest("at least one subject is required".into()));
        }
        let service = self.recommendations.as_ref().ok_or_else(|| {
            GardenwiseError::AiServiceFailure("no recommendation provider configured".into())
        })?;

        with_deadline(
            self.config.care_plan_timeout(),
            "care plan generation",
            service.schedule(conditions, subjects),
        )
        .await
    }

    async fn load(&self, id: Uuid) -> Result<MaintenanceTask> {
        with_deadline(self.config.store_timeout(), "task load", self.repository.get(id))
            .await?
            .ok_or_else(|| GardenwiseError::ScheduleNotFound(id.to_string()))
    }

    /// Queue the reminder for an active task; inactive tasks get none.
    async fn queue_reminder(&self, task: &MaintenanceTask) -> Result<Option<DateTime<Utc>>> {
        if !task.active {
            debug!(task_id = %task.id, "Task inactive, no reminder queued");
            return Ok(None);
        }
        let notification = self.queue.enqueue_for_task(task).await?;
        self.metrics.record_scheduled(task.task_type);
        Ok(Some(notification.scheduled_time))
    }

    async fn consult_ai(&self, task: &MaintenanceTask) -> Result<AiOutcome> {
        if !task.ai_recommended {
            return Ok(AiOutcome::default());
        }
        let Some(service) = &self.recommendations else {
            debug!(task_type = %task.task_type, "No recommendation provider configured");
            return Ok(AiOutcome::default());
        };

        let (subject, conditions) = task_conditions(task);
        let result = with_deadline(
            self.config.ai_budget(),
            "recommendation",
            service.recommend(&subject, &conditions),
        )
        .await;

        match result {
            Ok(notes) => Ok(AiOutcome { notes: Some(notes), degraded: false }),
            Err(err) => self.handle_ai_failure(task.task_type, err),
        }
    }

    fn handle_ai_failure(&self, task_type: TaskType, err: GardenwiseError) -> Result<AiOutcome> {
        let err = match err {
            GardenwiseError::AiServiceFailure(_) => err,
            other => GardenwiseError::AiServiceFailure(other.to_string()),
        };
        match self.config.ai_failure_policy {
            AiFailurePolicy::ProceedWithoutAi => {
                warn!(
                    task_type = %task_type,
                    error = %err,
                    "Recommendation provider failed, scheduling without AI input (degraded mode)"
                );
                Ok(AiOutcome { notes: None, degraded: true })
            }
            AiFailurePolicy::Fail => Err(err),
        }
    }
}
