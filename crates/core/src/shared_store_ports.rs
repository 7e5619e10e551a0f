//! Shared low-latency store port
//!
//! Counters, short-lived values and score-ordered sets shared by every
//! scheduler instance and dispatcher worker. Implementations must make each
//! method a single atomic operation; callers never hold application-level
//! locks around them.

use std::time::Duration;

use async_trait::async_trait;
use gardenwise_domain::Result;

/// Key/value, counter and ordered-set operations.
///
/// Store failures surface as `GardenwiseError::StoreUnavailable`.
#[async_trait]
pub trait SharedStore: Send + Sync {
    /// Read a plain value.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a plain value that disappears after `ttl`.
    async fn set_with_expiry(&self, key: &str, value: String, ttl: Duration) -> Result<()>;

    /// Increment a counter and return the new value in one step.
    ///
    /// The expiry is applied when the counter is created and left untouched
    /// by later increments.
    async fn incr_with_expiry(&self, key: &str, ttl: Duration) -> Result<u64>;

    /// Insert or replace `member` in the ordered set with `score`.
    async fn zadd(&self, key: &str, member: String, score: i64) -> Result<()>;

    /// Members with score `<= max_score`, lowest score first. Read-only.
    async fn zrange_by_score(&self, key: &str, max_score: i64) -> Result<Vec<(String, i64)>>;

    /// Remove `member`; returns whether it was present.
    async fn zrem(&self, key: &str, member: &str) -> Result<bool>;

    /// Number of members in the set.
    async fn zcard(&self, key: &str) -> Result<usize>;

    /// Atomically remove and return up to `limit` members with score
    /// `<= max_score`, lowest score first.
    ///
    /// A member returned here is returned to exactly one caller.
    async fn zclaim_due(&self, key: &str, max_score: i64, limit: usize) -> Result<Vec<String>>;
}
