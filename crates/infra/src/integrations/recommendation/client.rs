//! Cached, paced and retried access to a [`RecommendationProvider`].

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use gardenwise_common::{ExponentialBackoff, Jitter};
use gardenwise_core::{MetricsRecorder, NoopMetrics, RecommendationService};
use gardenwise_domain::{
    validate_recommendation_text, Conditions, GardenwiseError, RecommendationConfig, Result,
    ScheduleDocument,
};
use moka::sync::Cache;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::provider::{ProviderError, RecommendationProvider};

/// Recommendation client implementing the core [`RecommendationService`].
///
/// - Cache first: identical normalized inputs within the TTL never reach the
///   provider.
/// - A single pacing lock spaces the starts of outbound calls by at least
///   `min_call_interval`; the lock is held for the whole call.
/// - Up to `max_attempts` attempts, each bounded by `timeout`, with
///   exponential backoff plus jitter between them.
/// - Responses are validated before being cached or returned; a malformed
///   response counts as a failed attempt.
pub struct RecommendationClient {
    provider: Arc<dyn RecommendationProvider>,
    recommendations: Cache<String, Vec<String>>,
    schedules: Cache<String, ScheduleDocument>,
    last_call: Mutex<Option<Instant>>,
    backoff: ExponentialBackoff,
    metrics: Arc<dyn MetricsRecorder>,
    config: RecommendationConfig,
}

impl RecommendationClient {
    pub fn new(provider: Arc<dyn RecommendationProvider>, config: RecommendationConfig) -> Self {
        let backoff = ExponentialBackoff::new(config.base_backoff())
            .with_jitter(Jitter::Additive { max: config.max_jitter() });

        info!(
            ttl_seconds = config.cache_ttl_secs,
            max_capacity = config.cache_capacity,
            max_attempts = config.max_attempts,
            "Recommendation cache configuration loaded"
        );

        Self {
            provider,
            recommendations: build_cache(&config),
            schedules: build_cache(&config),
            last_call: Mutex::new(None),
            backoff,
            metrics: Arc::new(NoopMetrics),
            config,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<dyn MetricsRecorder>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Delay (before jitter) slept after each failed attempt that is retried.
    pub fn retry_delays(&self) -> Vec<Duration> {
        (1..self.config.max_attempts).map(|attempt| self.backoff.base_delay(attempt)).collect()
    }

    /// Cache key over the normalized subject and the (sorted) condition map.
    pub fn cache_key(subject: &str, conditions: &Conditions) -> String {
        let conditions = serde_json::to_string(conditions).unwrap_or_default();
        let mut hasher = blake3::Hasher::new();
        hasher.update(subject.trim().to_lowercase().as_bytes());
        hasher.update(b"\0");
        hasher.update(conditions.as_bytes());
        hex::encode(hasher.finalize().as_bytes())
    }

    /// Run `call` with pacing, per-attempt timeout and bounded retries.
    async fn call_with_retry<T, F, Fut>(&self, operation: &'static str, mut call: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, ProviderError>>,
    {
        let max_attempts = self.config.max_attempts.max(1);
        let mut last_error = ProviderError::Network("no attempt made".into());

        for attempt in 1..=max_attempts {
            let outcome = self.paced_attempt(&mut call).await;

            match outcome {
                Ok(value) => {
                    if attempt > 1 {
                        info!(operation, attempt, "Recommendation call succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(err) => {
                    let retryable = err.is_retryable();
                    if !retryable || attempt == max_attempts {
                        last_error = err;
                        break;
                    }
                    let delay = self.backoff.delay(attempt);
                    warn!(
                        operation,
                        attempt,
                        max_attempts,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %err,
                        "Recommendation call failed, retrying"
                    );
                    last_error = err;
                    tokio::time::sleep(delay).await;
                }
            }
        }

        warn!(operation, error = %last_error, "Recommendation call exhausted retries");
        Err(GardenwiseError::AiServiceFailure(format!("{operation}: {last_error}")))
    }

    /// One outbound call inside the pacing critical section.
    async fn paced_attempt<T, F, Fut>(&self, call: &mut F) -> std::result::Result<T, ProviderError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, ProviderError>>,
    {
        let mut last_call = self.last_call.lock().await;
        if let Some(previous) = *last_call {
            let ready_at = previous + self.config.min_call_interval();
            if Instant::now() < ready_at {
                tokio::time::sleep_until(ready_at).await;
            }
        }

        // stamped before the call so a cancelled attempt still counts
        let started = Instant::now();
        *last_call = Some(started);
        let timeout = self.config.timeout();
        let result = match tokio::time::timeout(timeout, call()).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout(timeout)),
        };
        drop(last_call);

        self.metrics.record_ai_call(started.elapsed(), result.is_ok());
        result
    }
}

fn build_cache<V: Clone + Send + Sync + 'static>(
    config: &RecommendationConfig,
) -> Cache<String, V> {
    Cache::builder().max_capacity(config.cache_capacity).time_to_live(config.cache_ttl()).build()
}

fn validate_texts(texts: Vec<String>) -> std::result::Result<Vec<String>, ProviderError> {
    if texts.is_empty() {
        return Err(ProviderError::Malformed("no recommendations returned".into()));
    }
    for text in &texts {
        validate_recommendation_text(text)
            .map_err(|err| ProviderError::Malformed(err.to_string()))?;
    }
    Ok(texts.into_iter().map(|text| text.trim().to_string()).collect())
}

#[async_trait]
impl RecommendationService for RecommendationClient {
    async fn recommend(&self, subject: &str, conditions: &Conditions) -> Result<Vec<String>> {
        let key = Self::cache_key(subject, conditions);
        if let Some(cached) = self.recommendations.get(&key) {
            debug!(subject, "Recommendation cache hit");
            self.metrics.record_ai_cache(true);
            return Ok(cached);
        }
        self.metrics.record_ai_cache(false);

        let texts = self
            .call_with_retry("recommend", move || async move {
                validate_texts(self.provider.recommendations(subject, conditions).await?)
            })
            .await?;

        self.recommendations.insert(key, texts.clone());
        Ok(texts)
    }

    async fn schedule(
        &self,
        conditions: &Conditions,
        subjects: &[String],
    ) -> Result<ScheduleDocument> {
        let key = Self::cache_key(&subjects.join("\n"), conditions);
        if let Some(cached) = self.schedules.get(&key) {
            debug!(subject_count = subjects.len(), "Care plan cache hit");
            self.metrics.record_ai_cache(true);
            return Ok(cached);
        }
        self.metrics.record_ai_cache(false);

        let document = self
            .call_with_retry("schedule", move || async move {
                let raw = self.provider.schedule(conditions, subjects).await?;
                ScheduleDocument::from_value(raw)
                    .map_err(|err| ProviderError::Malformed(err.to_string()))
            })
            .await?;

        self.schedules.insert(key, document.clone());
        Ok(document)
    }
}
