//! Scheduler and dispatcher counters
//!
//! [`SchedulerMetrics`] is the infra implementation of the core
//! [`MetricsRecorder`] port: per-task-type counters for the reminder
//! lifecycle plus [`AiCallMetrics`] for provider calls.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use gardenwise_core::MetricsRecorder;
use gardenwise_domain::TaskType;
use serde::Serialize;

use super::ai::AiCallMetrics;

const TASK_TYPES: usize = TaskType::ALL.len();

/// One counter per task type.
#[derive(Debug, Default)]
struct PerType([AtomicU64; TASK_TYPES]);

impl PerType {
    fn incr(&self, task_type: TaskType) {
        self.0[slot(task_type)].fetch_add(1, Ordering::Relaxed);
    }

    fn get(&self, task_type: TaskType) -> u64 {
        self.0[slot(task_type)].load(Ordering::Relaxed)
    }

    fn total(&self) -> u64 {
        self.0.iter().map(|counter| counter.load(Ordering::Relaxed)).sum()
    }

    fn by_type(&self) -> BTreeMap<TaskType, u64> {
        TaskType::ALL.iter().map(|task_type| (*task_type, self.get(*task_type))).collect()
    }
}

fn slot(task_type: TaskType) -> usize {
    match task_type {
        TaskType::Fertilizer => 0,
        TaskType::Water => 1,
        TaskType::Composting => 2,
        TaskType::Pruning => 3,
        TaskType::PestControl => 4,
    }
}

/// Thread-safe counters shared by the scheduler, dispatcher and
/// recommendation client.
#[derive(Debug, Default)]
pub struct SchedulerMetrics {
    scheduled: PerType,
    delivered: PerType,
    retried: PerType,
    failed: PerType,
    rate_limited: PerType,
    ai: AiCallMetrics,
}

/// Point-in-time copy of [`SchedulerMetrics`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub scheduled: u64,
    pub delivered: u64,
    pub retried: u64,
    pub failed: u64,
    pub rate_limited: u64,
    pub delivered_by_type: BTreeMap<TaskType, u64>,
    pub failed_by_type: BTreeMap<TaskType, u64>,
    pub ai_calls: u64,
    pub ai_errors: u64,
    pub ai_cache_hit_rate: f64,
    pub ai_latency_p50_ms: Option<u64>,
    pub ai_latency_p95_ms: Option<u64>,
    pub ai_latency_p99_ms: Option<u64>,
}

impl SchedulerMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Provider call metrics
    pub fn ai(&self) -> &AiCallMetrics {
        &self.ai
    }

    pub fn delivered(&self, task_type: TaskType) -> u64 {
        self.delivered.get(task_type)
    }

    pub fn failed(&self, task_type: TaskType) -> u64 {
        self.failed.get(task_type)
    }

    pub fn retried(&self, task_type: TaskType) -> u64 {
        self.retried.get(task_type)
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            scheduled: self.scheduled.total(),
            delivered: self.delivered.total(),
            retried: self.retried.total(),
            failed: self.failed.total(),
            rate_limited: self.rate_limited.total(),
            delivered_by_type: self.delivered.by_type(),
            failed_by_type: self.failed.by_type(),
            ai_calls: self.ai.calls.load(Ordering::SeqCst),
            ai_errors: self.ai.errors.load(Ordering::SeqCst),
            ai_cache_hit_rate: self.ai.cache_hit_rate(),
            ai_latency_p50_ms: self.ai.p50_latency_ms().ok(),
            ai_latency_p95_ms: self.ai.p95_latency_ms().ok(),
            ai_latency_p99_ms: self.ai.p99_latency_ms().ok(),
        }
    }
}

impl MetricsRecorder for SchedulerMetrics {
    fn record_scheduled(&self, task_type: TaskType) {
        self.scheduled.incr(task_type);
    }

    fn record_delivered(&self, task_type: TaskType) {
        self.delivered.incr(task_type);
    }

    fn record_retry(&self, task_type: TaskType) {
        self.retried.incr(task_type);
    }

    fn record_failed(&self, task_type: TaskType) {
        self.failed.incr(task_type);
    }

    fn record_rate_limited(&self, task_type: TaskType) {
        self.rate_limited.incr(task_type);
    }

    fn record_ai_call(&self, latency: Duration, success: bool) {
        if let Err(err) = self.ai.record_call(latency, success) {
            tracing::warn!(error = %err, "Failed to record AI call metric");
        }
    }

    fn record_ai_cache(&self, hit: bool) {
        if let Err(err) = self.ai.record_cache(hit) {
            tracing::warn!(error = %err, "Failed to record AI cache metric");
        }
    }
}
