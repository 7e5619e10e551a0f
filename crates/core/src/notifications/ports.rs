//! Port interfaces for reminder delivery

use async_trait::async_trait;
use gardenwise_domain::{Notification, Result};

/// Trait for the outbound notification channel (push, email, webhook...)
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    /// Deliver one reminder. Any error counts as a failed attempt.
    async fn deliver(&self, notification: &Notification) -> Result<()>;
}
