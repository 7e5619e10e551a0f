//! AI recommendation client
//!
//! [`RecommendationClient`] wraps any [`RecommendationProvider`] (see
//! [`crate::integrations::openai`]) with caching, pacing, retries and
//! response validation, and implements the core
//! [`RecommendationService`](gardenwise_core::RecommendationService) port.

pub mod client;
pub mod provider;

pub use client::RecommendationClient;
pub use provider::{ProviderError, RecommendationProvider};
