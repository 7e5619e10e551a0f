//! Wiring helpers that assemble a scheduler over the in-memory doubles.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveTime, TimeZone, Utc};
use gardenwise_common::{Clock, MockClock};
use gardenwise_core::{
    MaintenanceScheduler, NoopMetrics, NotificationQueue, RateLimiter, RecommendationService,
};
use gardenwise_domain::{
    Amount, AmountUnit, Frequency, RateLimitConfig, ScheduleRequest, SchedulerConfig, TaskType,
};

use super::repositories::MockTaskRepository;
use super::store::MockSharedStore;

/// 2025-06-02 04:00 UTC, before the usual 06:00 preferred time.
pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 2, 4, 0, 0).unwrap()
}

pub fn water_request() -> ScheduleRequest {
    ScheduleRequest {
        crop_id: "tomato-bed-1".into(),
        task_type: TaskType::Water,
        frequency: Frequency::Daily,
        amount: Amount::new(750.0, AmountUnit::Milliliters),
        preferred_time: NaiveTime::from_hms_opt(6, 0, 0).unwrap(),
        ai_recommended: false,
        environmental_factors: None,
        active: true,
    }
}

pub struct Harness {
    pub clock: MockClock,
    pub store: Arc<MockSharedStore>,
    pub repository: Arc<MockTaskRepository>,
    pub queue: NotificationQueue,
    pub limiter: RateLimiter,
    pub config: SchedulerConfig,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(SchedulerConfig::default(), RateLimitConfig::default())
    }

    pub fn with_config(config: SchedulerConfig, limits: RateLimitConfig) -> Self {
        let clock = MockClock::at(start_time());
        let store = Arc::new(MockSharedStore::new());
        let repository = Arc::new(MockTaskRepository::new());
        let shared_clock: Arc<dyn Clock> = Arc::new(clock.clone());

        let queue = NotificationQueue::new(store.clone(), shared_clock.clone(), &config);
        let limiter = RateLimiter::new(
            store.clone(),
            shared_clock,
            Arc::new(NoopMetrics),
            limits,
            Duration::from_secs(1),
        );

        Self { clock, store, repository, queue, limiter, config }
    }

    pub fn scheduler(&self) -> MaintenanceScheduler {
        MaintenanceScheduler::new(
            self.repository.clone(),
            self.limiter.clone(),
            self.queue.clone(),
            Arc::new(self.clock.clone()),
            self.config.clone(),
        )
    }

    pub fn scheduler_with_ai(
        &self,
        service: Arc<dyn RecommendationService>,
    ) -> MaintenanceScheduler {
        self.scheduler().with_recommendations(service)
    }
}
