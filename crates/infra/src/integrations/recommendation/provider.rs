//! Recommendation provider port and its error type.

use std::time::Duration;

use async_trait::async_trait;
use gardenwise_domain::Conditions;
use serde_json::Value;

/// Errors from a single provider call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    /// Connection failed, reset, or the request could not be sent
    #[error("Network error: {0}")]
    Network(String),

    /// Provider answered with a non-success status
    #[error("Provider returned status {status}: {message}")]
    Status { status: u16, message: String },

    /// Response arrived but does not have the expected shape
    #[error("Malformed response: {0}")]
    Malformed(String),

    /// Call did not finish within the per-call timeout
    #[error("Provider call timed out after {0:?}")]
    Timeout(Duration),
}

impl ProviderError {
    /// Whether another attempt may succeed.
    ///
    /// Authentication and other 4xx failures (except 408 and 429) are
    /// terminal; everything else is retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Status { status, .. } => {
                !(400..500).contains(status) || *status == 408 || *status == 429
            }
            Self::Network(_) | Self::Malformed(_) | Self::Timeout(_) => true,
        }
    }
}

/// Raw access to an AI recommendation backend.
///
/// Implementations perform exactly one outbound request per call; caching,
/// pacing, retries and response validation live in
/// [`RecommendationClient`](super::RecommendationClient).
#[async_trait]
pub trait RecommendationProvider: Send + Sync {
    /// Short advisory texts for `subject` under `conditions`.
    async fn recommendations(
        &self,
        subject: &str,
        conditions: &Conditions,
    ) -> Result<Vec<String>, ProviderError>;

    /// Unvalidated care-plan document for `subjects`.
    async fn schedule(
        &self,
        conditions: &Conditions,
        subjects: &[String],
    ) -> Result<Value, ProviderError>;
}
