//! In-memory `SharedStore` double with an outage switch.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use gardenwise_core::SharedStore;
use gardenwise_domain::{GardenwiseError, Result as DomainResult};
use parking_lot::Mutex;

#[derive(Default)]
struct State {
    values: HashMap<String, String>,
    counters: HashMap<String, u64>,
    sets: HashMap<String, Vec<(i64, String)>>,
}

/// Single-mutex store. TTLs are recorded nowhere; tests move the clock to
/// change keys instead.
#[derive(Default)]
pub struct MockSharedStore {
    state: Mutex<State>,
    down: AtomicBool,
}

impl MockSharedStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail with `StoreUnavailable`.
    pub fn set_unavailable(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }

    pub fn counter(&self, key: &str) -> u64 {
        self.state.lock().counters.get(key).copied().unwrap_or(0)
    }

    pub fn members(&self, key: &str) -> Vec<(i64, String)> {
        self.state.lock().sets.get(key).cloned().unwrap_or_default()
    }

    fn check(&self) -> DomainResult<()> {
        if self.down.load(Ordering::SeqCst) {
            return Err(GardenwiseError::StoreUnavailable("mock store is down".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl SharedStore for MockSharedStore {
    async fn get(&self, key: &str) -> DomainResult<Option<String>> {
        self.check()?;
        Ok(self.state.lock().values.get(key).cloned())
    }

    async fn set_with_expiry(&self, key: &str, value: String, _ttl: Duration) -> DomainResult<()> {
        self.check()?;
        self.state.lock().values.insert(key.to_string(), value);
        Ok(())
    }

    async fn incr_with_expiry(&self, key: &str, _ttl: Duration) -> DomainResult<u64> {
        self.check()?;
        let mut state = self.state.lock();
        let counter = state.counters.entry(key.to_string()).or_insert(0);
        *counter += 1;
        Ok(*counter)
    }

    async fn zadd(&self, key: &str, member: String, score: i64) -> DomainResult<()> {
        self.check()?;
        let mut state = self.state.lock();
        let set = state.sets.entry(key.to_string()).or_default();
        set.retain(|(_, existing)| *existing != member);
        set.push((score, member));
        set.sort();
        Ok(())
    }

    async fn zrange_by_score(&self, key: &str, max_score: i64) -> DomainResult<Vec<(String, i64)>> {
        self.check()?;
        Ok(self
            .members(key)
            .into_iter()
            .filter(|(score, _)| *score <= max_score)
            .map(|(score, member)| (member, score))
            .collect())
    }

    async fn zrem(&self, key: &str, member: &str) -> DomainResult<bool> {
        self.check()?;
        let mut state = self.state.lock();
        let Some(set) = state.sets.get_mut(key) else {
            return Ok(false);
        };
        let before = set.len();
        set.retain(|(_, existing)| existing != member);
        Ok(set.len() != before)
    }

    async fn zcard(&self, key: &str) -> DomainResult<usize> {
        self.check()?;
        Ok(self.state.lock().sets.get(key).map_or(0, Vec::len))
    }

    async fn zclaim_due(
        &self,
        key: &str,
        max_score: i64,
        limit: usize,
    ) -> DomainResult<Vec<String>> {
        self.check()?;
        let mut state = self.state.lock();
        let Some(set) = state.sets.get_mut(key) else {
            return Ok(Vec::new());
        };
        let due = set.iter().take_while(|(score, _)| *score <= max_score).count().min(limit);
        Ok(set.drain(..due).map(|(_, member)| member).collect())
    }
}
