//! Notification channels used by the dispatcher.

pub mod webhook;

use std::sync::Arc;

use async_trait::async_trait;
use gardenwise_core::NotificationChannel;
use gardenwise_domain::{Notification, NotificationChannelConfig, Result};
use tracing::info;

use crate::http::HttpClient;

pub use webhook::WebhookChannel;

/// Channel that only logs the reminder. Used when no webhook is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingChannel;

#[async_trait]
impl NotificationChannel for LoggingChannel {
    async fn deliver(&self, notification: &Notification) -> Result<()> {
        info!(
            task_id = %notification.task_id,
            task_type = %notification.task_type,
            crop_id = %notification.metadata.crop_id,
            scheduled_time = %notification.scheduled_time,
            priority = notification.priority,
            "Maintenance reminder"
        );
        Ok(())
    }
}

/// Webhook channel when a URL is configured, otherwise [`LoggingChannel`].
pub fn channel_from_config(
    config: &NotificationChannelConfig,
    http_client: HttpClient,
) -> Arc<dyn NotificationChannel> {
    match config.webhook_url.as_deref().map(str::trim).filter(|url| !url.is_empty()) {
        Some(url) => Arc::new(WebhookChannel::new(url, http_client)),
        None => Arc::new(LoggingChannel),
    }
}
