//! Queue ordering, clamping, claiming and cancellation.

mod support;

use std::time::Duration;

use chrono::{NaiveTime, TimeDelta};
use gardenwise_core::{NotificationQueue, SharedStore};
use gardenwise_domain::{
    Amount, AmountUnit, Frequency, GardenwiseError, MaintenanceTask, Notification, TaskType,
};
use support::fixtures::{start_time, Harness};
use uuid::Uuid;

fn task_due_in(task_type: TaskType, due_in: TimeDelta) -> MaintenanceTask {
    let now = start_time();
    let unit = task_type.canonical_unit();
    let (min, _) = task_type.amount_bounds();
    MaintenanceTask {
        id: Uuid::now_v7(),
        crop_id: "bed-7".into(),
        task_type,
        frequency: Frequency::Daily,
        amount: Amount::new(min, unit),
        preferred_time: NaiveTime::from_hms_opt(6, 0, 0).unwrap(),
        ai_recommended: false,
        environmental_factors: None,
        next_scheduled_time: now + due_in,
        last_completed_time: None,
        completion_streak: 0,
        completion_rate: 0.0,
        active: true,
        ai_notes: Vec::new(),
        created_at: now,
        updated_at: now,
    }
}

#[tokio::test]
async fn reminder_fires_lead_time_before_due() {
    let harness = Harness::new();
    let task = task_due_in(TaskType::Water, TimeDelta::hours(2));

    let notification = harness.queue.enqueue_for_task(&task).await.unwrap();

    assert_eq!(notification.scheduled_time, task.next_scheduled_time - TimeDelta::minutes(30));
    assert_eq!(notification.priority, 3);
    assert_eq!(notification.retry_count, 0);
    assert_eq!(harness.queue.pending_count(TaskType::Water).await.unwrap(), 1);
}

#[tokio::test]
async fn past_due_reminder_is_clamped_to_grace_window() {
    let harness = Harness::new();
    let task = task_due_in(TaskType::Fertilizer, TimeDelta::minutes(10));

    let notification = harness.queue.notification_for(&task);
    assert_eq!(notification.scheduled_time, start_time() + TimeDelta::minutes(5));
}

#[tokio::test]
async fn due_members_come_back_lowest_score_first() {
    let harness = Harness::new();
    let late = task_due_in(TaskType::Water, TimeDelta::hours(3));
    let early = task_due_in(TaskType::Water, TimeDelta::hours(1));
    harness.queue.enqueue_for_task(&late).await.unwrap();
    harness.queue.enqueue_for_task(&early).await.unwrap();

    let later = start_time() + TimeDelta::hours(4);
    let due = harness.queue.dequeue_due(TaskType::Water, later).await.unwrap();
    let order: Vec<Uuid> = due.iter().map(|n| n.task_id).collect();
    assert_eq!(order, vec![early.id, late.id]);

    // dequeue_due only reads
    assert_eq!(harness.queue.pending_count(TaskType::Water).await.unwrap(), 2);
}

#[tokio::test]
async fn claim_removes_what_it_returns() {
    let harness = Harness::new();
    let task = task_due_in(TaskType::Pruning, TimeDelta::hours(1));
    harness.queue.enqueue_for_task(&task).await.unwrap();

    let later = start_time() + TimeDelta::hours(2);
    let first = harness.queue.claim_due(TaskType::Pruning, later, 10).await.unwrap();
    let second = harness.queue.claim_due(TaskType::Pruning, later, 10).await.unwrap();

    assert_eq!(first.len(), 1);
    assert!(second.is_empty());
    assert_eq!(harness.queue.pending_count(TaskType::Pruning).await.unwrap(), 0);
}

#[tokio::test]
async fn claim_ignores_future_members() {
    let harness = Harness::new();
    let task = task_due_in(TaskType::Water, TimeDelta::hours(5));
    harness.queue.enqueue_for_task(&task).await.unwrap();

    let claimed = harness.queue.claim_due(TaskType::Water, start_time(), 10).await.unwrap();
    assert!(claimed.is_empty());
    assert_eq!(harness.queue.pending_count(TaskType::Water).await.unwrap(), 1);
}

#[tokio::test]
async fn retry_backs_off_by_retry_count() {
    let harness = Harness::new();
    let task = task_due_in(TaskType::Water, TimeDelta::hours(1));
    let original = harness.queue.notification_for(&task);

    let first = harness
        .queue
        .requeue_for_retry(&original, Duration::from_secs(300))
        .await
        .unwrap()
        .expect("requeued");
    assert_eq!(first.retry_count, 1);
    assert_eq!(first.scheduled_time, start_time() + TimeDelta::minutes(5));

    let second = harness
        .queue
        .requeue_for_retry(&first, Duration::from_secs(300))
        .await
        .unwrap()
        .expect("requeued");
    assert_eq!(second.retry_count, 2);
    assert_eq!(second.scheduled_time, start_time() + TimeDelta::minutes(10));
    assert_eq!(second.correlation_id, original.correlation_id);
}

#[tokio::test]
async fn cancel_only_touches_the_given_task() {
    let harness = Harness::new();
    let keep = task_due_in(TaskType::Water, TimeDelta::hours(1));
    let cancelled = task_due_in(TaskType::Water, TimeDelta::hours(2));
    harness.queue.enqueue_for_task(&keep).await.unwrap();
    harness.queue.enqueue_for_task(&cancelled).await.unwrap();

    let removed = harness.queue.cancel_for_task(TaskType::Water, cancelled.id).await.unwrap();
    assert_eq!(removed, 1);

    let remaining = harness.store.members(&NotificationQueue::queue_key(TaskType::Water));
    assert_eq!(remaining.len(), 1);
    let survivor = Notification::from_member(&remaining[0].1).unwrap();
    assert_eq!(survivor.task_id, keep.id);
}

#[tokio::test]
async fn retry_of_a_cancelled_reminder_is_dropped() {
    let harness = Harness::new();
    let task = task_due_in(TaskType::Water, TimeDelta::minutes(30));
    harness.queue.enqueue_for_task(&task).await.unwrap();

    // a worker claims the reminder, then the task is rescheduled mid-delivery
    let claimed = harness.queue.claim_due(TaskType::Water, start_time(), 10).await.unwrap();
    assert_eq!(claimed.len(), 1);
    harness.queue.cancel_for_task(TaskType::Water, task.id).await.unwrap();
    let replacement = harness.queue.enqueue_for_task(&task).await.unwrap();

    let retry =
        harness.queue.requeue_for_retry(&claimed[0], Duration::from_secs(300)).await.unwrap();
    assert!(retry.is_none());

    let queued = harness.store.members(&NotificationQueue::queue_key(TaskType::Water));
    assert_eq!(queued.len(), 1);
    let survivor = Notification::from_member(&queued[0].1).unwrap();
    assert_eq!(survivor.correlation_id, replacement.correlation_id);
}

#[tokio::test]
async fn retry_of_the_live_reminder_is_requeued() {
    let harness = Harness::new();
    let task = task_due_in(TaskType::Pruning, TimeDelta::minutes(30));
    let live = harness.queue.enqueue_for_task(&task).await.unwrap();
    harness.queue.claim_due(TaskType::Pruning, start_time(), 10).await.unwrap();

    let retry = harness.queue.requeue_for_retry(&live, Duration::from_secs(300)).await.unwrap();

    assert_eq!(retry.map(|retry| retry.retry_count), Some(1));
    assert_eq!(harness.queue.pending_count(TaskType::Pruning).await.unwrap(), 1);
}

#[tokio::test]
async fn queue_fails_closed_when_store_is_down() {
    let harness = Harness::new();
    let task = task_due_in(TaskType::Water, TimeDelta::hours(1));
    harness.store.set_unavailable(true);

    let err = harness.queue.enqueue_for_task(&task).await.unwrap_err();
    assert!(matches!(err, GardenwiseError::StoreUnavailable(_)));
}

#[tokio::test]
async fn undecodable_members_are_skipped() {
    let harness = Harness::new();
    let key = NotificationQueue::queue_key(TaskType::Composting);
    harness.store.zadd(&key, "not-a-notification".into(), 0).await.unwrap();

    let claimed = harness.queue.claim_due(TaskType::Composting, start_time(), 10).await.unwrap();
    assert!(claimed.is_empty());
    assert_eq!(harness.queue.pending_count(TaskType::Composting).await.unwrap(), 0);
}
