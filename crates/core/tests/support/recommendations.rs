//! Scripted `RecommendationService` double

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use gardenwise_core::RecommendationService;
use gardenwise_domain::{Conditions, GardenwiseError, Result as DomainResult, ScheduleDocument};

/// Returns fixed notes, or fails every call when `failing` is set.
pub struct MockRecommendations {
    notes: Vec<String>,
    failing: bool,
    calls: AtomicUsize,
}

impl MockRecommendations {
    pub fn answering(notes: &[&str]) -> Self {
        Self {
            notes: notes.iter().map(|note| note.to_string()).collect(),
            failing: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self { notes: Vec::new(), failing: true, calls: AtomicUsize::new(0) }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RecommendationService for MockRecommendations {
    async fn recommend(
        &self,
        _subject: &str,
        _conditions: &Conditions,
    ) -> DomainResult<Vec<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing {
            return Err(GardenwiseError::AiServiceFailure("provider down".into()));
        }
        Ok(self.notes.clone())
    }

    async fn schedule(
        &self,
        _conditions: &Conditions,
        subjects: &[String],
    ) -> DomainResult<ScheduleDocument> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing {
            return Err(GardenwiseError::AiServiceFailure("provider down".into()));
        }
        Ok(ScheduleDocument {
            tasks: subjects
                .iter()
                .map(|subject| serde_json::json!({ "subject": subject }))
                .collect(),
            frequency: "weekly".into(),
            duration: "30d".into(),
        })
    }
}
