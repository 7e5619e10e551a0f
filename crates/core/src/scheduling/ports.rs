//! Port interfaces for maintenance scheduling
//!
//! These traits define the boundaries between core business logic
//! and infrastructure implementations.

use async_trait::async_trait;
use gardenwise_domain::{Conditions, MaintenanceTask, Result, ScheduleDocument};
use uuid::Uuid;

/// Trait for persisting maintenance tasks
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Load a task by id, `None` when it does not exist
    async fn get(&self, id: Uuid) -> Result<Option<MaintenanceTask>>;

    /// Insert a new task
    async fn create(&self, task: &MaintenanceTask) -> Result<()>;

    /// Overwrite an existing task
    async fn save(&self, task: &MaintenanceTask) -> Result<()>;
}

/// Trait for the external AI recommendation provider
///
/// Implementations own caching, pacing and retries; a returned error means
/// every attempt failed.
#[async_trait]
pub trait RecommendationService: Send + Sync {
    /// Short advisory texts for a subject under the given conditions
    async fn recommend(&self, subject: &str, conditions: &Conditions) -> Result<Vec<String>>;

    /// Structured care plan covering several subjects
    async fn schedule(&self, conditions: &Conditions, subjects: &[String])
        -> Result<ScheduleDocument>;
}
