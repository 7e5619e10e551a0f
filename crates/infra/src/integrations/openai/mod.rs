/// OpenAI integration for garden recommendations
///
/// `OpenAIProvider` implements [`RecommendationProvider`] against the Chat
/// Completions API with JSON-schema constrained output.
///
/// # Usage
///
/// ```no_run
/// use gardenwise_domain::RecommendationConfig;
/// use gardenwise_infra::integrations::openai::OpenAIProvider;
/// # fn example() -> gardenwise_domain::Result<()> {
/// let config = RecommendationConfig {
///     api_key: Some(std::env::var("OPENAI_API_KEY").unwrap_or_default()),
///     ..RecommendationConfig::default()
/// };
/// let provider = OpenAIProvider::from_config(&config)?;
/// # let _ = provider;
/// # Ok(())
/// # }
/// ```
///
/// # Error Handling
///
/// Every failure is reported as a [`ProviderError`]; the caller decides what
/// to retry.
///
/// [`RecommendationProvider`]: crate::integrations::recommendation::RecommendationProvider
/// [`ProviderError`]: crate::integrations::recommendation::ProviderError
pub mod client;
pub mod types;

pub use client::OpenAIProvider;
