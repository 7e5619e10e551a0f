//! `MaintenanceScheduler` end to end over in-memory ports.

mod support;

use std::sync::Arc;

use chrono::{DateTime, NaiveTime, TimeDelta, TimeZone, Utc};
use gardenwise_common::Clock;
use gardenwise_core::NotificationQueue;
use gardenwise_domain::{
    AiFailurePolicy, Conditions, EnvironmentalFactors, GardenwiseError, RateLimitConfig,
    ScheduleRequest, SchedulerConfig, TaskType,
};
use support::fixtures::{start_time, water_request, Harness};
use support::recommendations::MockRecommendations;
use uuid::Uuid;

#[tokio::test]
async fn daily_water_task_is_due_today_at_preferred_time() {
    let harness = Harness::new();
    let scheduler = harness.scheduler();

    let response = scheduler.create_schedule(water_request()).await.unwrap();

    let six_am = Utc.with_ymd_and_hms(2025, 6, 2, 6, 0, 0).unwrap();
    assert_eq!(response.task.next_scheduled_time, six_am);
    assert_eq!(response.next_notification_at, Some(six_am - TimeDelta::minutes(30)));
    assert_eq!(response.task.completion_streak, 0);
    assert!(!response.degraded);

    assert!(harness.repository.stored(response.task.id).is_some());
    assert_eq!(harness.queue.pending_count(TaskType::Water).await.unwrap(), 1);
}

#[tokio::test]
async fn task_created_after_preferred_time_is_due_tomorrow() {
    let harness = Harness::new();
    harness.clock.advance_by(TimeDelta::hours(5)); // 09:00

    let response = harness.scheduler().create_schedule(water_request()).await.unwrap();

    let tomorrow = Utc.with_ymd_and_hms(2025, 6, 3, 6, 0, 0).unwrap();
    assert_eq!(response.task.next_scheduled_time, tomorrow);
}

#[tokio::test]
async fn reminder_inside_lead_time_is_clamped() {
    let harness = Harness::new();
    harness.clock.advance_by(TimeDelta::minutes(105)); // 05:45

    let response = harness.scheduler().create_schedule(water_request()).await.unwrap();

    assert_eq!(
        response.next_notification_at,
        Some(harness_now(&harness) + TimeDelta::minutes(5))
    );
}

fn harness_now(harness: &Harness) -> DateTime<Utc> {
    harness.clock.now()
}

#[tokio::test]
async fn invalid_request_is_rejected_before_quota() {
    let harness = Harness::new();
    let mut request = water_request();
    request.preferred_time = NaiveTime::from_hms_opt(22, 0, 0).unwrap();

    let err = harness.scheduler().create_schedule(request).await.unwrap_err();

    assert!(matches!(err, GardenwiseError::InvalidRequest(_)));
    assert_eq!(harness.repository.len(), 0);
    let key = harness.limiter.bucket_key(TaskType::Water);
    assert_eq!(harness.store.counter(&key), 0);
}

#[tokio::test]
async fn quota_exhaustion_surfaces_rate_limited() {
    let mut limits = RateLimitConfig::default();
    limits.per_task_type.insert("water".into(), 1);
    let harness = Harness::with_config(SchedulerConfig::default(), limits);
    let scheduler = harness.scheduler();

    scheduler.create_schedule(water_request()).await.unwrap();
    let err = scheduler.create_schedule(water_request()).await.unwrap_err();

    assert!(matches!(err, GardenwiseError::RateLimited(_)));
    assert_eq!(harness.repository.len(), 1);
}

#[tokio::test]
async fn late_completion_resets_streak() {
    let harness = Harness::new();
    let scheduler = harness.scheduler();
    let id = scheduler.create_schedule(water_request()).await.unwrap().task.id;

    let first = scheduler.complete_task(id).await.unwrap();
    assert_eq!(first.task.completion_streak, 1);

    harness.clock.advance_by(TimeDelta::hours(23));
    let on_time = scheduler.complete_task(id).await.unwrap();
    assert_eq!(on_time.task.completion_streak, 2);

    harness.clock.advance_by(TimeDelta::hours(25));
    let late = scheduler.complete_task(id).await.unwrap();
    assert_eq!(late.task.completion_streak, 1);
    assert!((late.task.completion_rate - 100.0 / 30.0).abs() < 1e-9);
}

#[tokio::test]
async fn completion_replaces_the_queued_reminder() {
    let harness = Harness::new();
    let scheduler = harness.scheduler();
    let id = scheduler.create_schedule(water_request()).await.unwrap().task.id;

    let response = scheduler.complete_task(id).await.unwrap();

    let tomorrow = Utc.with_ymd_and_hms(2025, 6, 3, 6, 0, 0).unwrap();
    assert_eq!(response.task.next_scheduled_time, tomorrow);
    assert_eq!(response.task.last_completed_time, Some(start_time()));

    let members = harness.store.members(&NotificationQueue::queue_key(TaskType::Water));
    assert_eq!(members.len(), 1);
    assert_eq!(members[0].0, (tomorrow - TimeDelta::minutes(30)).timestamp());
}

#[tokio::test]
async fn inactive_task_cannot_be_completed() {
    let harness = Harness::new();
    let scheduler = harness.scheduler();
    let mut request = water_request();
    request.active = false;

    let created = scheduler.create_schedule(request).await.unwrap();
    assert_eq!(created.next_notification_at, None);

    let err = scheduler.complete_task(created.task.id).await.unwrap_err();
    assert!(matches!(err, GardenwiseError::InvalidRequest(_)));
}

#[tokio::test]
async fn deactivating_cancels_reminders_and_keeps_history() {
    let harness = Harness::new();
    let scheduler = harness.scheduler();
    let id = scheduler.create_schedule(water_request()).await.unwrap().task.id;
    scheduler.complete_task(id).await.unwrap();

    let mut request = water_request();
    request.active = false;
    let updated = scheduler.update_schedule(id, request).await.unwrap();

    assert!(!updated.task.active);
    assert_eq!(updated.task.completion_streak, 1);
    assert_eq!(updated.task.last_completed_time, Some(start_time()));
    assert_eq!(updated.next_notification_at, None);
    assert_eq!(harness.queue.pending_count(TaskType::Water).await.unwrap(), 0);
}

#[tokio::test]
async fn changing_task_type_moves_the_reminder() {
    let harness = Harness::new();
    let scheduler = harness.scheduler();
    let id = scheduler.create_schedule(water_request()).await.unwrap().task.id;

    let mut request = water_request();
    request.task_type = TaskType::PestControl;
    request.amount.value = 100.0;
    scheduler.update_schedule(id, request).await.unwrap();

    assert_eq!(harness.queue.pending_count(TaskType::Water).await.unwrap(), 0);
    assert_eq!(harness.queue.pending_count(TaskType::PestControl).await.unwrap(), 1);
}

#[tokio::test]
async fn unknown_ids_are_not_found() {
    let harness = Harness::new();
    let scheduler = harness.scheduler();
    let missing = Uuid::now_v7();

    assert!(matches!(
        scheduler.get_schedule(missing).await,
        Err(GardenwiseError::ScheduleNotFound(_))
    ));
    assert!(matches!(
        scheduler.complete_task(missing).await,
        Err(GardenwiseError::ScheduleNotFound(_))
    ));
    assert!(matches!(
        scheduler.update_schedule(missing, water_request()).await,
        Err(GardenwiseError::ScheduleNotFound(_))
    ));
}

#[tokio::test]
async fn get_returns_persisted_state() {
    let harness = Harness::new();
    let scheduler = harness.scheduler();
    let created = scheduler.create_schedule(water_request()).await.unwrap();

    let fetched = scheduler.get_schedule(created.task.id).await.unwrap();
    assert_eq!(fetched.task, created.task);
}

fn hot_ai_request() -> ScheduleRequest {
    let mut request = water_request();
    request.ai_recommended = true;
    request.environmental_factors = Some(EnvironmentalFactors::new(34.0, 35.0, 90_000.0));
    request.preferred_time = NaiveTime::from_hms_opt(14, 0, 0).unwrap();
    request
}

#[tokio::test]
async fn ai_notes_are_stored_and_hot_weather_advances_watering() {
    let harness = Harness::new();
    let provider = Arc::new(MockRecommendations::answering(&["Water at the base of the plant."]));
    let scheduler = harness.scheduler_with_ai(provider.clone());

    let response = scheduler.create_schedule(hot_ai_request()).await.unwrap();

    assert_eq!(provider.calls(), 1);
    assert_eq!(response.recommendations, vec!["Water at the base of the plant.".to_string()]);
    assert_eq!(response.task.ai_notes, response.recommendations);
    // 14:00 today, six hours earlier for heat
    let expected = Utc.with_ymd_and_hms(2025, 6, 2, 8, 0, 0).unwrap();
    assert_eq!(response.task.next_scheduled_time, expected);
}

#[tokio::test]
async fn provider_failure_degrades_by_default() {
    let harness = Harness::new();
    let scheduler = harness.scheduler_with_ai(Arc::new(MockRecommendations::failing()));

    let response = scheduler.create_schedule(hot_ai_request()).await.unwrap();

    assert!(response.degraded);
    assert!(response.recommendations.is_empty());
    assert!(harness.repository.stored(response.task.id).is_some());
}

#[tokio::test]
async fn provider_failure_fails_create_under_strict_policy() {
    let config =
        SchedulerConfig { ai_failure_policy: AiFailurePolicy::Fail, ..SchedulerConfig::default() };
    let harness = Harness::with_config(config, RateLimitConfig::default());
    let scheduler = harness.scheduler_with_ai(Arc::new(MockRecommendations::failing()));

    let err = scheduler.create_schedule(hot_ai_request()).await.unwrap_err();

    assert!(matches!(err, GardenwiseError::AiServiceFailure(_)));
    assert_eq!(harness.repository.len(), 0);
}

#[tokio::test]
async fn non_ai_tasks_never_call_the_provider() {
    let harness = Harness::new();
    let provider = Arc::new(MockRecommendations::answering(&["Mulch after watering."]));
    let scheduler = harness.scheduler_with_ai(provider.clone());

    scheduler.create_schedule(water_request()).await.unwrap();
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn queue_outage_fails_the_operation() {
    let harness = Harness::new();
    let scheduler = harness.scheduler();
    harness.store.set_unavailable(true);

    let err = scheduler.create_schedule(water_request()).await.unwrap_err();
    assert!(matches!(err, GardenwiseError::StoreUnavailable(_)));
}

#[tokio::test]
async fn care_plan_comes_from_provider() {
    let harness = Harness::new();
    let scheduler = harness.scheduler_with_ai(Arc::new(MockRecommendations::answering(&[])));
    let subjects = vec!["tomato".to_string(), "basil".to_string()];

    let plan = scheduler.generate_care_plan(&subjects, &Conditions::new()).await.unwrap();

    assert_eq!(plan.tasks.len(), 2);
    assert_eq!(plan.frequency, "weekly");
}

#[tokio::test]
async fn care_plan_needs_provider_and_subjects() {
    let harness = Harness::new();
    let subjects = vec!["tomato".to_string()];

    let err =
        harness.scheduler().generate_care_plan(&subjects, &Conditions::new()).await.unwrap_err();
    assert!(matches!(err, GardenwiseError::AiServiceFailure(_)));

    let scheduler = harness.scheduler_with_ai(Arc::new(MockRecommendations::answering(&[])));
    let err = scheduler.generate_care_plan(&[], &Conditions::new()).await.unwrap_err();
    assert!(matches!(err, GardenwiseError::InvalidRequest(_)));
}
