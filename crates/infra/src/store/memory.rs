//! Process-local [`SharedStore`] backed by `DashMap`.
//!
//! Every operation runs under the shard lock of its key, which makes each
//! call atomic with respect to every other call on the same key. Expired
//! entries are dropped lazily on access and by [`InMemorySharedStore::purge_expired`].

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use dashmap::DashMap;
use gardenwise_common::{Clock, SystemClock};
use gardenwise_core::SharedStore;
use gardenwise_domain::Result;
use tracing::debug;

#[derive(Debug, Clone)]
struct Expiring<T> {
    value: T,
    expires_at: DateTime<Utc>,
}

impl<T> Expiring<T> {
    fn is_live(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// Score-ordered set with O(log n) member replacement.
#[derive(Debug, Default)]
struct SortedSet {
    by_score: BTreeSet<(i64, String)>,
    scores: HashMap<String, i64>,
}

impl SortedSet {
    fn insert(&mut self, member: String, score: i64) {
        if let Some(previous) = self.scores.insert(member.clone(), score) {
            self.by_score.remove(&(previous, member.clone()));
        }
        self.by_score.insert((score, member));
    }

    fn remove(&mut self, member: &str) -> bool {
        match self.scores.remove(member) {
            Some(score) => self.by_score.remove(&(score, member.to_string())),
            None => false,
        }
    }

    fn range(&self, max_score: i64) -> impl Iterator<Item = &(i64, String)> {
        self.by_score.iter().take_while(move |(score, _)| *score <= max_score)
    }

    fn pop_due(&mut self, max_score: i64, limit: usize) -> Vec<String> {
        let mut claimed = Vec::new();
        while claimed.len() < limit {
            let Some(first) = self.by_score.first() else { break };
            if first.0 > max_score {
                break;
            }
            if let Some((_, member)) = self.by_score.pop_first() {
                self.scores.remove(&member);
                claimed.push(member);
            }
        }
        claimed
    }

    fn len(&self) -> usize {
        self.by_score.len()
    }
}

/// In-memory shared store for a single process.
///
/// Suitable for one scheduler process with many dispatcher workers; a
/// multi-process deployment needs a networked implementation of the same
/// port.
pub struct InMemorySharedStore {
    values: DashMap<String, Expiring<String>>,
    counters: DashMap<String, Expiring<u64>>,
    sets: DashMap<String, SortedSet>,
    clock: Arc<dyn Clock>,
}

impl Default for InMemorySharedStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemorySharedStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Store whose expiries follow `clock`.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self { values: DashMap::new(), counters: DashMap::new(), sets: DashMap::new(), clock }
    }

    /// Drop expired values and counters; returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let before = self.values.len() + self.counters.len();
        self.values.retain(|_, entry| entry.is_live(now));
        self.counters.retain(|_, entry| entry.is_live(now));
        let removed = before.saturating_sub(self.values.len() + self.counters.len());
        if removed > 0 {
            debug!(removed, "Purged expired shared store entries");
        }
        removed
    }

    fn expiry(&self, ttl: Duration) -> DateTime<Utc> {
        let ttl = TimeDelta::from_std(ttl).unwrap_or(TimeDelta::MAX);
        self.clock.now().checked_add_signed(ttl).unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}

#[async_trait]
impl SharedStore for InMemorySharedStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let now = self.clock.now();
        let value = self
            .values
            .get(key)
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.value.clone());
        if value.is_none() {
            self.values.remove_if(key, |_, entry| !entry.is_live(now));
        }
        Ok(value)
    }

    async fn set_with_expiry(&self, key: &str, value: String, ttl: Duration) -> Result<()> {
        let expires_at = self.expiry(ttl);
        self.values.insert(key.to_string(), Expiring { value, expires_at });
        Ok(())
    }

    async fn incr_with_expiry(&self, key: &str, ttl: Duration) -> Result<u64> {
        let now = self.clock.now();
        let mut entry = self
            .counters
            .entry(key.to_string())
            .or_insert_with(|| Expiring { value: 0, expires_at: self.expiry(ttl) });
        if !entry.is_live(now) {
            *entry = Expiring { value: 0, expires_at: self.expiry(ttl) };
        }
        entry.value = entry.value.saturating_add(1);
        Ok(entry.value)
    }

    async fn zadd(&self, key: &str, member: String, score: i64) -> Result<()> {
        self.sets.entry(key.to_string()).or_default().insert(member, score);
        Ok(())
    }

    async fn zrange_by_score(&self, key: &str, max_score: i64) -> Result<Vec<(String, i64)>> {
        Ok(self
            .sets
            .get(key)
            .map(|set| {
                set.range(max_score).map(|(score, member)| (member.clone(), *score)).collect()
            })
            .unwrap_or_default())
    }

    async fn zrem(&self, key: &str, member: &str) -> Result<bool> {
        Ok(self.sets.get_mut(key).is_some_and(|mut set| set.remove(member)))
    }

    async fn zcard(&self, key: &str) -> Result<usize> {
        Ok(self.sets.get(key).map_or(0, |set| set.len()))
    }

    async fn zclaim_due(&self, key: &str, max_score: i64, limit: usize) -> Result<Vec<String>> {
        Ok(self.sets.get_mut(key).map(|mut set| set.pop_due(max_score, limit)).unwrap_or_default())
    }
}
