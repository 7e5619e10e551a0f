//! Deadline helper for external calls.

use std::future::Future;
use std::time::Duration;

use gardenwise_domain::{GardenwiseError, Result};

/// Run `fut`, converting an elapsed deadline into `GardenwiseError::Timeout`.
pub async fn with_deadline<T, F>(limit: Duration, operation: &str, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(GardenwiseError::Timeout(format!(
            "{operation} exceeded {}ms",
            limit.as_millis()
        ))),
    }
}
