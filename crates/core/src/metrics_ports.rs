//! Scheduler metrics port
//!
//! Core services report counters and AI latency through this trait so the
//! infra layer can decide how they are aggregated. Recording never fails
//! the operation being measured.

use std::time::Duration;

use gardenwise_domain::TaskType;

/// Sink for scheduler and dispatcher counters.
pub trait MetricsRecorder: Send + Sync {
    /// A reminder was queued for a task.
    fn record_scheduled(&self, task_type: TaskType);

    /// A reminder reached the notification channel.
    fn record_delivered(&self, task_type: TaskType);

    /// A reminder was re-queued after a failed delivery.
    fn record_retry(&self, task_type: TaskType);

    /// A reminder was dropped after exhausting its retries.
    fn record_failed(&self, task_type: TaskType);

    /// A create/update was rejected by the hourly quota.
    fn record_rate_limited(&self, task_type: TaskType);

    /// One outbound recommendation provider call finished.
    fn record_ai_call(&self, latency: Duration, success: bool);

    /// A recommendation lookup was answered from (or missed) the cache.
    fn record_ai_cache(&self, hit: bool);
}

/// Recorder that drops everything. Used when metrics are not wired up.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMetrics;

impl MetricsRecorder for NoopMetrics {
    fn record_scheduled(&self, _task_type: TaskType) {}

    fn record_delivered(&self, _task_type: TaskType) {}

    fn record_retry(&self, _task_type: TaskType) {}

    fn record_failed(&self, _task_type: TaskType) {}

    fn record_rate_limited(&self, _task_type: TaskType) {}

    fn record_ai_call(&self, _latency: Duration, _success: bool) {}

    fn record_ai_cache(&self, _hit: bool) {}
}
