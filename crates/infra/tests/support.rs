use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveTime, TimeZone, Utc};
use gardenwise_common::{Clock, MockClock};
use gardenwise_core::{MaintenanceScheduler, NotificationChannel, NotificationQueue, RateLimiter};
use gardenwise_domain::{
    Amount, AmountUnit, DispatcherConfig, Frequency, GardenwiseError, Notification,
    RateLimitConfig, Result, ScheduleRequest, SchedulerConfig, TaskType,
};
use gardenwise_infra::database::{DbManager, SqliteTaskRepository};
use gardenwise_infra::dispatch::NotificationDispatcher;
use gardenwise_infra::observability::metrics::SchedulerMetrics;
use gardenwise_infra::store::InMemorySharedStore;
use parking_lot::Mutex;
use tempfile::TempDir;
use uuid::Uuid;

/// Temporary database wrapper that keeps the underlying file alive for the
/// duration of a test run.
pub struct TestDatabase {
    pub manager: Arc<DbManager>,
    _temp_dir: TempDir,
}

impl TestDatabase {
    /// Create a migrated database in a fresh temp directory.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("temp dir should be created");
        let manager = DbManager::new(temp_dir.path().join("garden.db"), 4)
            .expect("db manager should be created");
        manager.run_migrations().expect("migrations should run");

        Self { manager: Arc::new(manager), _temp_dir: temp_dir }
    }
}

impl Default for TestDatabase {
    fn default() -> Self {
        Self::new()
    }
}

/// 2025-06-02 04:00 UTC.
pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 2, 4, 0, 0).unwrap()
}

pub fn request(task_type: TaskType, crop_id: &str) -> ScheduleRequest {
    let amount = match task_type {
        TaskType::Water => Amount::new(750.0, AmountUnit::Milliliters),
        TaskType::Fertilizer => Amount::new(20.0, AmountUnit::Grams),
        TaskType::Composting => Amount::new(2_000.0, AmountUnit::Grams),
        TaskType::Pruning => Amount::new(1.0, AmountUnit::Plants),
        TaskType::PestControl => Amount::new(50.0, AmountUnit::Milliliters),
    };
    ScheduleRequest {
        crop_id: crop_id.into(),
        task_type,
        frequency: Frequency::Daily,
        amount,
        preferred_time: NaiveTime::from_hms_opt(6, 0, 0).unwrap(),
        ai_recommended: false,
        environmental_factors: None,
        active: true,
    }
}

/// Channel that records every delivery and can be told to fail.
#[derive(Default)]
pub struct RecordingChannel {
    delivered: Mutex<Vec<Notification>>,
    failing: Mutex<bool>,
}

impl RecordingChannel {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail_deliveries(&self, failing: bool) {
        *self.failing.lock() = failing;
    }

    pub fn delivered(&self) -> Vec<Notification> {
        self.delivered.lock().clone()
    }

    /// Deliveries per task id.
    pub fn counts(&self) -> HashMap<Uuid, usize> {
        let mut counts = HashMap::new();
        for notification in self.delivered.lock().iter() {
            *counts.entry(notification.task_id).or_insert(0) += 1;
        }
        counts
    }
}

#[async_trait]
impl NotificationChannel for RecordingChannel {
    async fn deliver(&self, notification: &Notification) -> Result<()> {
        if *self.failing.lock() {
            return Err(GardenwiseError::Network("channel offline".into()));
        }
        // yield so concurrent workers interleave
        tokio::task::yield_now().await;
        self.delivered.lock().push(notification.clone());
        Ok(())
    }
}

/// Scheduler, dispatcher and their shared collaborators over real
/// infrastructure adapters.
pub struct Stack {
    pub db: TestDatabase,
    pub clock: MockClock,
    pub store: Arc<InMemorySharedStore>,
    pub queue: NotificationQueue,
    pub metrics: Arc<SchedulerMetrics>,
    pub channel: Arc<RecordingChannel>,
    pub scheduler: MaintenanceScheduler,
}

impl Stack {
    pub fn new() -> Self {
        Self::with_limits(RateLimitConfig::default())
    }

    pub fn with_limits(limits: RateLimitConfig) -> Self {
        let db = TestDatabase::new();
        let clock = MockClock::at(start_time());
        let shared_clock: Arc<dyn Clock> = Arc::new(clock.clone());
        let store = Arc::new(InMemorySharedStore::with_clock(shared_clock.clone()));
        let metrics = Arc::new(SchedulerMetrics::new());
        let config = SchedulerConfig::default();

        let queue = NotificationQueue::new(store.clone(), shared_clock.clone(), &config);
        let limiter = RateLimiter::new(
            store.clone(),
            shared_clock.clone(),
            metrics.clone(),
            limits,
            config.store_timeout(),
        );
        let repository = Arc::new(SqliteTaskRepository::new(db.manager.clone()));
        let scheduler =
            MaintenanceScheduler::new(repository, limiter, queue.clone(), shared_clock, config)
                .with_metrics(metrics.clone());

        Self { db, clock, store, queue, metrics, channel: RecordingChannel::new(), scheduler }
    }

    pub fn dispatcher(&self, config: DispatcherConfig) -> NotificationDispatcher {
        NotificationDispatcher::new(
            self.queue.clone(),
            self.channel.clone(),
            Arc::new(self.clock.clone()),
            config,
        )
        .with_metrics(self.metrics.clone())
    }
}

impl Default for Stack {
    fn default() -> Self {
        Self::new()
    }
}
