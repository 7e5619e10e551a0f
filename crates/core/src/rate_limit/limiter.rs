//! Per-task-type hourly quota backed by the shared store.

use std::sync::Arc;
use std::time::Duration;

use gardenwise_common::time::{hour_bucket, SECONDS_PER_HOUR};
use gardenwise_common::Clock;
use gardenwise_domain::constants::RATE_LIMIT_KEY_PREFIX;
use gardenwise_domain::{GardenwiseError, RateLimitConfig, Result, TaskType};
use tracing::{debug, warn};

use crate::deadline::with_deadline;
use crate::metrics_ports::MetricsRecorder;
use crate::shared_store_ports::SharedStore;

/// Fixed-window hourly limiter.
///
/// Each `(task_type, hour)` pair owns one counter. The counter is bumped and
/// read in a single store call, so concurrent callers never both observe the
/// last free slot. When the store is unreachable the request is allowed.
#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn SharedStore>,
    clock: Arc<dyn Clock>,
    metrics: Arc<dyn MetricsRecorder>,
    limits: RateLimitConfig,
    store_timeout: Duration,
}

impl RateLimiter {
    pub fn new(
        store: Arc<dyn SharedStore>,
        clock: Arc<dyn Clock>,
        metrics: Arc<dyn MetricsRecorder>,
        limits: RateLimitConfig,
        store_timeout: Duration,
    ) -> Self {
        Self { store, clock, metrics, limits, store_timeout }
    }

    /// Store key for the bucket covering the current hour.
    pub fn bucket_key(&self, task_type: TaskType) -> String {
        format!("{RATE_LIMIT_KEY_PREFIX}:{task_type}:{}", hour_bucket(self.clock.now()))
    }

    /// Count one request against the current hour, rejecting it past the limit.
    pub async fn check_and_increment(&self, task_type: TaskType) -> Result<()> {
        let key = self.bucket_key(task_type);
        let limit = self.limits.limit_for(task_type);
        // Buckets outlive their hour slightly so late increments still expire.
        let ttl = Duration::from_secs(2 * SECONDS_PER_HOUR.unsigned_abs());

        let count = match with_deadline(
            self.store_timeout,
            "rate limit increment",
            self.store.incr_with_expiry(&key, ttl),
        )
        .await
        {
            Ok(count) => count,
            Err(err) => {
                warn!(
                    task_type = %task_type,
                    error = %err,
                    "Rate limit store unavailable, allowing request"
                );
                return Ok(());
            }
        };

        if count > limit {
            debug!(task_type = %task_type, count, limit, "Hourly quota exhausted");
            self.metrics.record_rate_limited(task_type);
            return Err(GardenwiseError::RateLimited(format!(
                "{task_type} allows {limit} requests per hour; try again later"
            )));
        }
        Ok(())
    }
}
