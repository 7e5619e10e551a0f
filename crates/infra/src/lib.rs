//! # Gardenwise Infrastructure
//!
//! Infrastructure implementations of core ports.
//!
//! This crate contains:
//! - SQLite task repository (r2d2 pool)
//! - In-memory shared store backing the rate limiter and notification queue
//! - Recommendation client with caching, pacing and retries, plus the
//!   chat-completions provider
//! - Notification dispatcher and delivery channels
//! - Configuration loading, logging and metrics
//!
//! ## Architecture
//! - Implements traits defined in `gardenwise-core`
//! - Contains all "impure" code (I/O, network, background tasks)

pub mod config;
pub mod database;
pub mod dispatch;
pub mod errors;
pub mod http;
pub mod integrations;
pub mod observability;
pub mod store;

// Re-export commonly used items
pub use database::{DbManager, SqliteTaskRepository};
pub use dispatch::{DispatcherError, NotificationDispatcher};
pub use errors::InfraError;
pub use http::HttpClient;
pub use integrations::openai::OpenAIProvider;
pub use integrations::recommendation::RecommendationClient;
pub use observability::metrics::SchedulerMetrics;
pub use store::InMemorySharedStore;
