//! Error types used throughout the application

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for Gardenwise
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum GardenwiseError {
    /// Field-level input validation failure; never retried.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Schedule not found: {0}")]
    ScheduleNotFound(String),

    /// The recommendation provider failed after every retry.
    #[error("AI service failure: {0}")]
    AiServiceFailure(String),

    /// Hourly quota exhausted for a task type; callers should try later.
    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),

    /// The shared low-latency store (counters, cache, queue) is unreachable.
    #[error("Shared store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Operation timed out: {0}")]
    Timeout(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl GardenwiseError {
    /// Whether a local retry with backoff may succeed.
    ///
    /// Validation, not-found and quota errors are terminal and returned to
    /// the caller synchronously.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::StoreUnavailable(_)
                | Self::Database(_)
                | Self::Network(_)
                | Self::Timeout(_)
                | Self::AiServiceFailure(_)
        )
    }

    /// Stable label suitable for metrics and structured logs.
    pub fn label(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) => "invalid_request",
            Self::ScheduleNotFound(_) => "schedule_not_found",
            Self::AiServiceFailure(_) => "ai_service_failure",
            Self::RateLimited(_) => "rate_limited",
            Self::StoreUnavailable(_) => "store_unavailable",
            Self::Database(_) => "database",
            Self::Config(_) => "config",
            Self::Network(_) => "network",
            Self::Timeout(_) => "timeout",
            Self::Internal(_) => "internal",
        }
    }
}

/// Result type alias for Gardenwise operations
pub type Result<T> = std::result::Result<T, GardenwiseError>;
