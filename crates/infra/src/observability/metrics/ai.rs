//! Recommendation provider call metrics
//!
//! Tracks outbound AI call counts, failures, cache effectiveness and call
//! latency for P50/P95/P99 calculations.
//!
//! ## Design
//! - **VecDeque ring buffer** for O(1) eviction (not Vec with remove(0))
//! - **Poison-safe locking** with explicit match pattern (no .expect())
//! - **SeqCst ordering** for atomics used in derived metrics

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::observability::{MetricsError, MetricsResult};

/// Maximum latency samples kept for percentile calculations
const MAX_SAMPLES: usize = 1000;

/// Metrics for outbound recommendation calls
#[derive(Debug)]
pub struct AiCallMetrics {
    /// Outbound calls attempted (each retry counts)
    pub calls: AtomicU64,
    /// Attempts that failed (error, timeout or malformed response)
    pub errors: AtomicU64,
    /// Lookups answered from the cache
    pub cache_hits: AtomicU64,
    /// Lookups that had to go to the provider
    pub cache_misses: AtomicU64,
    /// Call latencies in milliseconds (ring buffer, max 1000)
    latencies: Mutex<VecDeque<u64>>,
}

impl Default for AiCallMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl AiCallMetrics {
    pub fn new() -> Self {
        Self {
            calls: AtomicU64::new(0),
            errors: AtomicU64::new(0),
            cache_hits: AtomicU64::new(0),
            cache_misses: AtomicU64::new(0),
            latencies: Mutex::new(VecDeque::with_capacity(MAX_SAMPLES)),
        }
    }

    /// Record one finished outbound call
    pub fn record_call(&self, latency: Duration, success: bool) -> MetricsResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !success {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }

        let ms = u64::try_from(latency.as_millis()).unwrap_or(u64::MAX);
        let mut latencies = match self.latencies.lock() {
            Ok(guard) => guard,
            Err(poison_err) => {
                tracing::warn!(
                    metric = "AiCallMetrics::latencies",
                    "Mutex poisoned during latency recording, recovering data"
                );
                poison_err.into_inner()
            }
        };
        latencies.push_back(ms);
        if latencies.len() > MAX_SAMPLES {
            latencies.pop_front();
        }
        Ok(())
    }

    /// Record a cache lookup outcome
    pub fn record_cache(&self, hit: bool) -> MetricsResult<()> {
        if hit {
            self.cache_hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.cache_misses.fetch_add(1, Ordering::Relaxed);
        }
        Ok(())
    }

    /// Fraction of failed calls, 0.0 when nothing was recorded
    pub fn error_rate(&self) -> f64 {
        let calls = self.calls.load(Ordering::SeqCst);
        if calls == 0 {
            return 0.0;
        }
        self.errors.load(Ordering::SeqCst) as f64 / calls as f64
    }

    /// Fraction of lookups served from cache, 0.0 when nothing was recorded
    pub fn cache_hit_rate(&self) -> f64 {
        let hits = self.cache_hits.load(Ordering::Relaxed);
        let total = hits + self.cache_misses.load(Ordering::Relaxed);
        if total == 0 {
            return 0.0;
        }
        hits as f64 / total as f64
    }

    /// Get P50 (median) latency in milliseconds
    pub fn p50_latency_ms(&self) -> MetricsResult<u64> {
        self.percentile(0.50, "P50")
    }

    /// Get P95 latency in milliseconds
    pub fn p95_latency_ms(&self) -> MetricsResult<u64> {
        self.percentile(0.95, "P95")
    }

    /// Get P99 latency in milliseconds
    pub fn p99_latency_ms(&self) -> MetricsResult<u64> {
        self.percentile(0.99, "P99")
    }

    /// Holds the lock for the whole calculation for a consistent snapshot.
    fn percentile(&self, percentile: f64, metric_name: &'static str) -> MetricsResult<u64> {
        let latencies = match self.latencies.lock() {
            Ok(guard) => guard,
            Err(poison_err) => {
                tracing::warn!(
                    metric = "AiCallMetrics::latencies",
                    percentile = percentile,
                    "Mutex poisoned during percentile read, recovering"
                );
                poison_err.into_inner()
            }
        };

        if latencies.is_empty() {
            return Err(MetricsError::EmptyData { metric: metric_name });
        }

        let mut sorted: Vec<u64> = latencies.iter().copied().collect();
        sorted.sort_unstable();

        let index = ((sorted.len() as f64 * percentile) as usize).min(sorted.len() - 1);
        Ok(sorted[index])
    }
}
