//! Notification dispatcher with a fixed pool of ticking workers.
//!
//! Each worker wakes on its own interval, walks every task type, claims the
//! reminders that are due and hands them to the [`NotificationChannel`].
//! Claiming removes a reminder from its queue before delivery starts, so two
//! workers never deliver the same reminder. Join handles are tracked,
//! cancellation is explicit, and every delivery is wrapped in a timeout.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use gardenwise_common::SystemClock;
//! use gardenwise_core::NotificationQueue;
//! use gardenwise_domain::{DispatcherConfig, SchedulerConfig};
//! use gardenwise_infra::dispatch::NotificationDispatcher;
//! use gardenwise_infra::integrations::notify::LoggingChannel;
//! use gardenwise_infra::store::InMemorySharedStore;
//!
//! # async fn example() -> Result<(), gardenwise_infra::dispatch::DispatcherError> {
//! let clock = Arc::new(SystemClock);
//! let store = Arc::new(InMemorySharedStore::new());
//! let queue = NotificationQueue::new(store, clock.clone(), &SchedulerConfig::default());
//! let mut dispatcher = NotificationDispatcher::new(
//!     queue,
//!     Arc::new(LoggingChannel),
//!     clock,
//!     DispatcherConfig::default(),
//! );
//!
//! dispatcher.start()?;
//! // ... application runs ...
//! dispatcher.stop().await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

use gardenwise_common::Clock;
use gardenwise_core::{MetricsRecorder, NoopMetrics, NotificationChannel, NotificationQueue};
use gardenwise_domain::{DispatcherConfig, GardenwiseError, Notification, TaskType};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use super::error::{DispatcherError, DispatcherResult};

const DEFAULT_JOIN_TIMEOUT: Duration = Duration::from_secs(5);

/// What happened to the reminders handled in one pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DispatchSummary {
    pub delivered: usize,
    pub retried: usize,
    pub failed: usize,
    /// Failed reminders not retried because their task was rescheduled
    pub superseded: usize,
    /// Task types whose queue could not be read this pass
    pub claim_errors: usize,
}

impl DispatchSummary {
    fn merge(&mut self, other: DispatchSummary) {
        self.delivered += other.delivered;
        self.retried += other.retried;
        self.failed += other.failed;
        self.superseded += other.superseded;
        self.claim_errors += other.claim_errors;
    }

    pub fn handled(&self) -> usize {
        self.delivered + self.retried + self.failed + self.superseded
    }
}

/// State shared by every worker.
struct DispatchContext {
    queue: NotificationQueue,
    channel: Arc<dyn NotificationChannel>,
    clock: Arc<dyn Clock>,
    metrics: Arc<dyn MetricsRecorder>,
    config: DispatcherConfig,
}

impl DispatchContext {
    /// One pass over every task type.
    async fn run_pass(&self, worker: usize) -> DispatchSummary {
        let mut summary = DispatchSummary::default();
        for task_type in TaskType::ALL {
            summary.merge(self.drain(worker, task_type).await);
        }
        if summary.handled() > 0 {
            debug!(
                worker,
                delivered = summary.delivered,
                retried = summary.retried,
                failed = summary.failed,
                "Dispatch pass completed"
            );
        }
        summary
    }

    async fn drain(&self, worker: usize, task_type: TaskType) -> DispatchSummary {
        let mut summary = DispatchSummary::default();
        let now = self.clock.now();

        let due = match self.queue.claim_due(task_type, now, self.config.claim_batch_size).await {
            Ok(due) => due,
            Err(err) => {
                warn!(
                    worker,
                    task_type = %task_type,
                    error = %err,
                    "Failed to claim due notifications"
                );
                summary.claim_errors += 1;
                return summary;
            }
        };

        for notification in due {
            match self.dispatch_one(worker, &notification).await {
                Outcome::Delivered => summary.delivered += 1,
                Outcome::Retried => summary.retried += 1,
                Outcome::Failed => summary.failed += 1,
                Outcome::Superseded => summary.superseded += 1,
            }
        }
        summary
    }

    async fn dispatch_one(&self, worker: usize, notification: &Notification) -> Outcome {
        let task_type = notification.task_type;
        let timeout = self.config.delivery_timeout();

        let result = match tokio::time::timeout(timeout, self.channel.deliver(notification)).await {
            Ok(result) => result,
            Err(_) => Err(GardenwiseError::Timeout(format!("delivery exceeded {timeout:?}"))),
        };

        let err = match result {
            Ok(()) => {
                self.metrics.record_delivered(task_type);
                debug!(
                    worker,
                    task_id = %notification.task_id,
                    correlation_id = %notification.correlation_id,
                    "Notification delivered"
                );
                return Outcome::Delivered;
            }
            Err(err) => err,
        };

        if notification.retry_count >= self.config.max_retries {
            self.metrics.record_failed(task_type);
            error!(
                worker,
                task_id = %notification.task_id,
                task_type = %task_type,
                retry_count = notification.retry_count,
                error = %err,
                "Notification delivery failed permanently"
            );
            return Outcome::Failed;
        }

        match self.queue.requeue_for_retry(notification, self.config.retry_delay()).await {
            Ok(None) => {
                info!(
                    worker,
                    task_id = %notification.task_id,
                    correlation_id = %notification.correlation_id,
                    error = %err,
                    "Notification delivery failed after its task was rescheduled, not retrying"
                );
                Outcome::Superseded
            }
            Ok(Some(retry)) => {
                self.metrics.record_retry(task_type);
                warn!(
                    worker,
                    task_id = %notification.task_id,
                    retry_count = retry.retry_count,
                    next_attempt = %retry.scheduled_time,
                    error = %err,
                    "Notification delivery failed, retry scheduled"
                );
                Outcome::Retried
            }
            Err(requeue_err) => {
                self.metrics.record_failed(task_type);
                error!(
                    worker,
                    task_id = %notification.task_id,
                    error = %err,
                    requeue_error = %requeue_err,
                    "Notification delivery failed and could not be re-queued"
                );
                Outcome::Failed
            }
        }
    }
}

enum Outcome {
    Delivered,
    Retried,
    Failed,
    Superseded,
}

/// Notification dispatcher with explicit lifecycle management.
pub struct NotificationDispatcher {
    context: Arc<DispatchContext>,
    join_timeout: Duration,
    cancellation: CancellationToken,
    handles: Vec<JoinHandle<()>>,
}

impl NotificationDispatcher {
    pub fn new(
        queue: NotificationQueue,
        channel: Arc<dyn NotificationChannel>,
        clock: Arc<dyn Clock>,
        config: DispatcherConfig,
    ) -> Self {
        Self {
            context: Arc::new(DispatchContext {
                queue,
                channel,
                clock,
                metrics: Arc::new(NoopMetrics),
                config,
            }),
            join_timeout: DEFAULT_JOIN_TIMEOUT,
            cancellation: CancellationToken::new(),
            handles: Vec::new(),
        }
    }

    /// Report delivery counters to `metrics`. Ignored once workers hold the context.
    pub fn with_metrics(mut self, metrics: Arc<dyn MetricsRecorder>) -> Self {
        if let Some(context) = Arc::get_mut(&mut self.context) {
            context.metrics = metrics;
        }
        self
    }

    pub fn with_join_timeout(mut self, join_timeout: Duration) -> Self {
        self.join_timeout = join_timeout;
        self
    }

    /// Run a single pass synchronously on the caller's task.
    pub async fn tick_once(&self) -> DispatchSummary {
        self.context.run_pass(0).await
    }

    /// Spawn the worker pool.
    #[instrument(skip(self))]
    pub fn start(&mut self) -> DispatcherResult<()> {
        if self.is_running() {
            return Err(DispatcherError::AlreadyRunning);
        }

        let workers = self.context.config.workers.max(1);
        let tick = self.context.config.tick_interval();
        info!(workers, tick_secs = tick.as_secs(), "Starting notification dispatcher");

        self.cancellation = CancellationToken::new();
        for worker in 0..workers {
            let context = Arc::clone(&self.context);
            let cancel = self.cancellation.clone();
            // Spread first ticks across the interval so workers do not wake in lockstep.
            let offset = tick.mul_f64(worker as f64 / workers as f64);
            self.handles.push(tokio::spawn(worker_loop(worker, context, tick, offset, cancel)));
        }

        info!("Notification dispatcher started");
        Ok(())
    }

    /// Cancel every worker and wait for them to finish.
    #[instrument(skip(self))]
    pub async fn stop(&mut self) -> DispatcherResult<()> {
        if !self.is_running() {
            return Err(DispatcherError::NotRunning);
        }

        info!("Stopping notification dispatcher");
        self.cancellation.cancel();

        let handles = std::mem::take(&mut self.handles);
        let joined =
            tokio::time::timeout(self.join_timeout, futures::future::join_all(handles)).await;
        self.cancellation = CancellationToken::new();

        let results = match joined {
            Ok(results) => results,
            Err(_) => {
                warn!("Dispatcher workers did not complete within timeout");
                return Err(DispatcherError::Timeout { seconds: self.join_timeout.as_secs() });
            }
        };

        if let Some(err) = results.into_iter().find_map(Result::err) {
            warn!(error = %err, "Dispatcher worker panicked");
            return Err(DispatcherError::TaskJoinFailed(err.to_string()));
        }

        info!("Notification dispatcher stopped");
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        !self.handles.is_empty()
    }
}

async fn worker_loop(
    worker: usize,
    context: Arc<DispatchContext>,
    tick: Duration,
    offset: Duration,
    cancel: CancellationToken,
) {
    let mut interval = tokio::time::interval_at(Instant::now() + offset, tick);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                debug!(worker, "Dispatcher worker cancelled");
                break;
            }
            _ = interval.tick() => {
                context.run_pass(worker).await;
            }
        }
    }
}

impl Drop for NotificationDispatcher {
    fn drop(&mut self) {
        if self.is_running() {
            warn!("NotificationDispatcher dropped while running; cancelling workers");
            self.cancellation.cancel();
        }
    }
}
