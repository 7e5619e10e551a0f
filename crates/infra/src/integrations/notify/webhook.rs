//! Webhook notification channel.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use gardenwise_core::NotificationChannel;
use gardenwise_domain::{Notification, Result, TaskType};
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use crate::http::HttpClient;

/// JSON body posted for each reminder.
#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    task_id: Uuid,
    task_type: TaskType,
    crop_id: &'a str,
    scheduled_time: DateTime<Utc>,
    priority: u8,
    attempt: u32,
    correlation_id: Uuid,
    message: String,
}

impl<'a> From<&'a Notification> for WebhookPayload<'a> {
    fn from(notification: &'a Notification) -> Self {
        Self {
            task_id: notification.task_id,
            task_type: notification.task_type,
            crop_id: &notification.metadata.crop_id,
            scheduled_time: notification.scheduled_time,
            priority: notification.priority,
            attempt: notification.retry_count + 1,
            correlation_id: notification.correlation_id,
            message: format!(
                "{} due at {} for crop {}",
                notification.task_type,
                notification.metadata.preferred_time.format("%H:%M"),
                notification.metadata.crop_id
            ),
        }
    }
}

/// Posts reminders as JSON to a fixed URL. Any non-2xx status is a failed
/// delivery.
pub struct WebhookChannel {
    http_client: HttpClient,
    url: String,
}

impl WebhookChannel {
    pub fn new(url: impl Into<String>, http_client: HttpClient) -> Self {
        Self { http_client, url: url.into() }
    }
}

#[async_trait]
impl NotificationChannel for WebhookChannel {
    async fn deliver(&self, notification: &Notification) -> Result<()> {
        let payload = WebhookPayload::from(notification);
        self.http_client.post_json(&self.url, &payload).await?;
        debug!(
            task_id = %notification.task_id,
            correlation_id = %notification.correlation_id,
            "Webhook notification delivered"
        );
        Ok(())
    }
}
