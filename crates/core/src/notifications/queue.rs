//! Time-ordered reminder queue over the shared store.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use gardenwise_common::Clock;
use gardenwise_domain::constants::QUEUE_KEY_PREFIX;
use gardenwise_domain::{
    GardenwiseError, MaintenanceTask, Notification, NotificationMetadata, Result, SchedulerConfig,
    TaskType,
};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::deadline::with_deadline;
use crate::shared_store_ports::SharedStore;

/// How long the current-reminder marker outlives the reminder's delivery time.
const CURRENT_MARKER_SLACK_SECS: i64 = 24 * 60 * 60;
/// Marker value left by `cancel_for_task`; matches no correlation id.
const CANCELLED_MARKER: &str = "cancelled";

/// Per-task-type ordered sets of [`Notification`]s scored by scheduled time.
///
/// Queue operations fail closed: a store error is returned to the caller,
/// since a lost enqueue means a missed reminder.
#[derive(Clone)]
pub struct NotificationQueue {
    store: Arc<dyn SharedStore>,
    clock: Arc<dyn Clock>,
    lead_time: TimeDelta,
    past_due_clamp: TimeDelta,
    store_timeout: Duration,
}

impl NotificationQueue {
    pub fn new(
        store: Arc<dyn SharedStore>,
        clock: Arc<dyn Clock>,
        config: &SchedulerConfig,
    ) -> Self {
        Self {
            store,
            clock,
            lead_time: to_delta(config.lead_time()),
            past_due_clamp: to_delta(config.past_due_clamp()),
            store_timeout: config.store_timeout(),
        }
    }

    /// Store key of the set holding `task_type` reminders.
    pub fn queue_key(task_type: TaskType) -> String {
        format!("{QUEUE_KEY_PREFIX}:{task_type}")
    }

    /// Store key naming the correlation id of a task's live reminder.
    pub fn current_key(task_id: Uuid) -> String {
        format!("{QUEUE_KEY_PREFIX}:current:{task_id}")
    }

    /// Delivery time for a task due at `due`: the lead time before it, or a
    /// short grace period from now when that has already passed.
    pub fn delivery_time(&self, due: DateTime<Utc>) -> DateTime<Utc> {
        let now = self.clock.now();
        let scheduled = due - self.lead_time;
        if scheduled < now {
            now + self.past_due_clamp
        } else {
            scheduled
        }
    }

    /// Build the reminder for the task's current `next_scheduled_time`.
    pub fn notification_for(&self, task: &MaintenanceTask) -> Notification {
        Notification {
            task_id: task.id,
            task_type: task.task_type,
            scheduled_time: self.delivery_time(task.next_scheduled_time),
            priority: task.task_type.notification_priority(),
            retry_count: 0,
            correlation_id: Uuid::new_v4(),
            metadata: NotificationMetadata {
                crop_id: task.crop_id.clone(),
                frequency: task.frequency,
                preferred_time: task.preferred_time,
            },
        }
    }

    /// Insert a reminder into its task type's set.
    pub async fn enqueue(&self, notification: &Notification) -> Result<()> {
        let key = Self::queue_key(notification.task_type);
        let member = notification.to_member()?;
        with_deadline(
            self.store_timeout,
            "notification enqueue",
            self.store.zadd(&key, member, notification.score()),
        )
        .await?;
        debug!(
            task_id = %notification.task_id,
            task_type = %notification.task_type,
            scheduled_time = %notification.scheduled_time,
            retry_count = notification.retry_count,
            "Notification enqueued"
        );
        Ok(())
    }

    /// Build and enqueue the reminder for a task, marking it as the task's
    /// live reminder.
    pub async fn enqueue_for_task(&self, task: &MaintenanceTask) -> Result<Notification> {
        let notification = self.notification_for(task);
        let ttl = (notification.scheduled_time - self.clock.now()).max(TimeDelta::zero())
            + TimeDelta::seconds(CURRENT_MARKER_SLACK_SECS);
        self.set_marker(task.id, notification.correlation_id.to_string(), ttl).await?;
        self.enqueue(&notification).await?;
        Ok(notification)
    }

    /// Reminders due at or before `now`, lowest score first, left in place.
    pub async fn dequeue_due(
        &self,
        task_type: TaskType,
        now: DateTime<Utc>,
    ) -> Result<Vec<Notification>> {
        let key = Self::queue_key(task_type);
        let members = with_deadline(
            self.store_timeout,
            "notification range query",
            self.store.zrange_by_score(&key, now.timestamp()),
        )
        .await?;
        Ok(decode_members(&key, members.into_iter().map(|(member, _)| member)))
    }

    /// Remove and return up to `limit` due reminders.
    ///
    /// Each returned reminder has been taken out of the queue before the
    /// caller sees it; no other caller can receive the same one.
    pub async fn claim_due(
        &self,
        task_type: TaskType,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<Notification>> {
        let key = Self::queue_key(task_type);
        let members = with_deadline(
            self.store_timeout,
            "notification claim",
            self.store.zclaim_due(&key, now.timestamp(), limit),
        )
        .await?;
        Ok(decode_members(&key, members.into_iter()))
    }

    /// Put a failed reminder back with its retry count bumped and its
    /// delivery pushed to `now + retry_delay * retry_count`.
    ///
    /// Returns `None` without queueing anything when the task's reminder was
    /// cancelled or replaced while this one was out for delivery. Reminders
    /// with no marker at all are re-queued.
    pub async fn requeue_for_retry(
        &self,
        notification: &Notification,
        retry_delay: Duration,
    ) -> Result<Option<Notification>> {
        if self.is_superseded(notification).await? {
            debug!(
                task_id = %notification.task_id,
                correlation_id = %notification.correlation_id,
                "Dropping retry for superseded notification"
            );
            return Ok(None);
        }

        let retry_count = notification.retry_count.saturating_add(1);
        let multiplier = i32::try_from(retry_count).unwrap_or(i32::MAX);
        let delay = to_delta(retry_delay)
            .checked_mul(multiplier)
            .ok_or_else(|| GardenwiseError::Internal("retry delay overflow".into()))?;

        let retry = Notification {
            retry_count,
            scheduled_time: self.clock.now() + delay,
            ..notification.clone()
        };
        self.enqueue(&retry).await?;

        // a cancel may have landed between the check and the insert
        if self.is_superseded(&retry).await? {
            let key = Self::queue_key(retry.task_type);
            let member = retry.to_member()?;
            with_deadline(
                self.store_timeout,
                "notification cancel",
                self.store.zrem(&key, &member),
            )
            .await?;
            return Ok(None);
        }
        Ok(Some(retry))
    }

    /// Number of reminders queued for a task type.
    pub async fn pending_count(&self, task_type: TaskType) -> Result<usize> {
        let key = Self::queue_key(task_type);
        with_deadline(self.store_timeout, "notification count", self.store.zcard(&key)).await
    }

    /// Drop every queued reminder belonging to `task_id`.
    ///
    /// The task's marker is cleared first, so a reminder that is mid-delivery
    /// right now will not be re-queued if that delivery fails.
    pub async fn cancel_for_task(&self, task_type: TaskType, task_id: Uuid) -> Result<usize> {
        let ttl = TimeDelta::seconds(CURRENT_MARKER_SLACK_SECS);
        self.set_marker(task_id, CANCELLED_MARKER.to_string(), ttl).await?;

        let key = Self::queue_key(task_type);
        let members = with_deadline(
            self.store_timeout,
            "notification scan",
            self.store.zrange_by_score(&key, i64::MAX),
        )
        .await?;

        let mut removed = 0;
        for (member, _) in members {
            let belongs = Notification::from_member(&member)
                .map(|notification| notification.task_id == task_id)
                .unwrap_or(false);
            if !belongs {
                continue;
            }
            let was_present = with_deadline(
                self.store_timeout,
                "notification cancel",
                self.store.zrem(&key, &member),
            )
            .await?;
            if was_present {
                removed += 1;
            }
        }

        if removed > 0 {
            debug!(
                task_id = %task_id,
                task_type = %task_type,
                removed,
                "Cancelled queued notifications"
            );
        }
        Ok(removed)
    }

    /// Whether the task's marker names a different reminder.
    async fn is_superseded(&self, notification: &Notification) -> Result<bool> {
        let current = with_deadline(
            self.store_timeout,
            "notification marker read",
            self.store.get(&Self::current_key(notification.task_id)),
        )
        .await?;
        Ok(current.is_some_and(|current| current != notification.correlation_id.to_string()))
    }

    async fn set_marker(&self, task_id: Uuid, value: String, ttl: TimeDelta) -> Result<()> {
        let ttl = ttl.to_std().unwrap_or(Duration::MAX);
        with_deadline(
            self.store_timeout,
            "notification marker write",
            self.store.set_with_expiry(&Self::current_key(task_id), value, ttl),
        )
        .await
    }
}

fn decode_members(key: &str, members: impl Iterator<Item = String>) -> Vec<Notification> {
    members
        .filter_map(|member| match Notification::from_member(&member) {
            Ok(notification) => Some(notification),
            Err(err) => {
                warn!(queue = key, error = %err, "Skipping undecodable queue member");
                None
            }
        })
        .collect()
}

fn to_delta(duration: Duration) -> TimeDelta {
    TimeDelta::from_std(duration).unwrap_or(TimeDelta::MAX)
}
