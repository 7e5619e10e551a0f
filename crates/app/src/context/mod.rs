//! Application context - dependency injection container

use std::sync::Arc;
use std::time::Duration;

use gardenwise_common::{Clock, SystemClock};
use gardenwise_core::{MaintenanceScheduler, MetricsRecorder, NotificationQueue, RateLimiter};
use gardenwise_domain::{GardenwiseConfig, GardenwiseError, Result};
use gardenwise_infra::integrations::notify::channel_from_config;
use gardenwise_infra::observability::metrics::MetricsSnapshot;
use gardenwise_infra::{
    DbManager, HttpClient, InMemorySharedStore, NotificationDispatcher, OpenAIProvider,
    RecommendationClient, SchedulerMetrics, SqliteTaskRepository,
};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// How often expired shared-store entries are swept.
const STORE_PURGE_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Application context - holds all services and dependencies
pub struct AppContext {
    pub config: GardenwiseConfig,
    pub db: Arc<DbManager>,
    pub store: Arc<InMemorySharedStore>,
    pub metrics: Arc<SchedulerMetrics>,
    pub scheduler: Arc<MaintenanceScheduler>,
    dispatcher: Mutex<NotificationDispatcher>,
    janitor: std::sync::Mutex<Option<(CancellationToken, JoinHandle<()>)>>,
}

impl AppContext {
    /// Create a new application context with default configuration
    pub async fn new() -> Result<Self> {
        Self::new_with_config(GardenwiseConfig::default()).await
    }

    /// Wire every service from `config` against the system clock.
    pub async fn new_with_config(config: GardenwiseConfig) -> Result<Self> {
        Self::new_with_clock(config, Arc::new(SystemClock)).await
    }

    /// Wire every service from `config`; tests pass a mock clock.
    pub async fn new_with_clock(config: GardenwiseConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        config.validate()?;

        let db = {
            let database = config.database.clone();
            tokio::task::spawn_blocking(move || {
                let db = DbManager::from_config(&database)?;
                db.run_migrations()?;
                Ok::<_, GardenwiseError>(db)
            })
            .await
            .map_err(|e| GardenwiseError::Internal(format!("database init task failed: {e}")))??
        };
        let db = Arc::new(db);

        let store = Arc::new(InMemorySharedStore::with_clock(clock.clone()));
        let metrics = Arc::new(SchedulerMetrics::new());
        let recorder: Arc<dyn MetricsRecorder> = metrics.clone();

        let queue = NotificationQueue::new(store.clone(), clock.clone(), &config.scheduler);
        let rate_limiter = RateLimiter::new(
            store.clone(),
            clock.clone(),
            recorder.clone(),
            config.rate_limits.clone(),
            config.scheduler.store_timeout(),
        );
        let repository = Arc::new(SqliteTaskRepository::new(db.clone()));

        let mut scheduler = MaintenanceScheduler::new(
            repository,
            rate_limiter,
            queue.clone(),
            clock.clone(),
            config.scheduler.clone(),
        )
        .with_metrics(recorder.clone());

        if let Some(client) = recommendation_client(&config, recorder.clone())? {
            scheduler = scheduler.with_recommendations(Arc::new(client));
        }

        let http_client = HttpClient::builder()
            .timeout(config.dispatcher.delivery_timeout())
            .build()?;
        let channel = channel_from_config(&config.notifications, http_client);
        let dispatcher =
            NotificationDispatcher::new(queue, channel, clock, config.dispatcher.clone())
                .with_metrics(recorder);

        info!(db_path = %db.path().display(), "Application context initialized");

        Ok(Self {
            config,
            db,
            store,
            metrics,
            scheduler: Arc::new(scheduler),
            dispatcher: Mutex::new(dispatcher),
            janitor: std::sync::Mutex::new(None),
        })
    }

    /// Start the dispatcher workers and the store janitor.
    pub async fn start(&self) -> Result<()> {
        self.dispatcher.lock().await.start()?;

        let mut janitor = self.janitor.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if janitor.is_none() {
            let cancel = CancellationToken::new();
            let handle = tokio::spawn(purge_loop(self.store.clone(), cancel.clone()));
            *janitor = Some((cancel, handle));
        }
        Ok(())
    }

    /// Whether the dispatcher workers are running.
    pub async fn is_running(&self) -> bool {
        self.dispatcher.lock().await.is_running()
    }

    /// Check the database answers queries.
    pub async fn health_check(&self) -> Result<()> {
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || db.health_check())
            .await
            .map_err(|e| GardenwiseError::Internal(format!("health check task failed: {e}")))?
    }

    /// Counters accumulated since startup.
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Stop background work and log final counters. Safe to call twice.
    pub async fn shutdown(&self) -> Result<()> {
        info!("shutdown called on AppContext");

        let janitor = self.janitor.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).take();
        if let Some((cancel, handle)) = janitor {
            cancel.cancel();
            if let Err(err) = handle.await {
                warn!(error = %err, "store janitor task failed");
            }
        }

        let mut dispatcher = self.dispatcher.lock().await;
        if dispatcher.is_running() {
            dispatcher.stop().await?;
        }

        let snapshot = self.metrics.snapshot();
        info!(
            scheduled = snapshot.scheduled,
            delivered = snapshot.delivered,
            failed = snapshot.failed,
            rate_limited = snapshot.rate_limited,
            "final scheduler metrics"
        );
        Ok(())
    }
}

/// Build the recommendation client when recommendations are enabled and an
/// API key is configured.
fn recommendation_client(
    config: &GardenwiseConfig,
    metrics: Arc<dyn MetricsRecorder>,
) -> Result<Option<RecommendationClient>> {
    let settings = &config.recommendation;
    if !settings.enabled {
        info!("recommendations disabled");
        return Ok(None);
    }
    if settings.api_key.as_deref().map_or(true, |key| key.trim().is_empty()) {
        warn!("recommendations enabled but no API key configured; scheduling without them");
        return Ok(None);
    }

    let provider = OpenAIProvider::from_config(settings)?;
    Ok(Some(RecommendationClient::new(Arc::new(provider), settings.clone()).with_metrics(metrics)))
}

async fn purge_loop(store: Arc<InMemorySharedStore>, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(STORE_PURGE_INTERVAL);
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = interval.tick() => {
                let purged = store.purge_expired();
                if purged > 0 {
                    tracing::debug!(purged, "purged expired shared-store entries");
                }
            }
        }
    }
}
