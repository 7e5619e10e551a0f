/// OpenAI Chat Completions backend for garden recommendations
use async_trait::async_trait;
use gardenwise_domain::{Conditions, GardenwiseError, RecommendationConfig, Result};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::debug;

use super::types::{
    ChatCompletionRequest, ChatCompletionResponse, ChatMessage, JsonSchema, RecommendationContent,
    ResponseFormat,
};
use crate::http::HttpClient;
use crate::integrations::recommendation::{ProviderError, RecommendationProvider};

const DEFAULT_MAX_TOKENS: u32 = 1_024;
const DEFAULT_TEMPERATURE: f32 = 0.3;

const SYSTEM_PROMPT: &str = "You are a horticulture assistant that helps gardeners plan \
maintenance tasks. Keep every recommendation practical and between 10 and 500 characters.";

/// OpenAI-compatible recommendation provider
///
/// One `recommendations`/`schedule` call is one HTTP request. The HTTP
/// client timeout is a backstop; the per-call deadline is enforced by the
/// caller.
pub struct OpenAIProvider {
    http_client: HttpClient,
    api_key: String,
    model: String,
    api_url: String,
}

impl OpenAIProvider {
    /// Create a provider posting to `{endpoint}/chat/completions`
    pub fn new(api_key: String, endpoint: &str, http_client: HttpClient) -> Self {
        Self {
            http_client,
            api_key,
            model: RecommendationConfig::default().model,
            api_url: format!("{}/chat/completions", endpoint.trim_end_matches('/')),
        }
    }

    /// Build a provider from configuration; the API key is required.
    pub fn from_config(config: &RecommendationConfig) -> Result<Self> {
        let api_key = config.api_key.clone().filter(|key| !key.trim().is_empty()).ok_or_else(
            || GardenwiseError::Config("recommendation.api_key is required".into()),
        )?;
        let http_client = HttpClient::builder().timeout(config.timeout()).build()?;
        Ok(Self::new(api_key, &config.endpoint, http_client).with_model(config.model.clone()))
    }

    /// Use a different chat model
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    fn recommendation_prompt(subject: &str, conditions: &Conditions) -> String {
        format!(
            "Give up to three short care recommendations for: {subject}.\n\
             Current conditions (JSON): {}\n\
             Return JSON with a 'recommendations' array of strings.",
            conditions_json(conditions)
        )
    }

    fn schedule_prompt(conditions: &Conditions, subjects: &[String]) -> String {
        format!(
            "Create a maintenance plan covering: {}.\n\
             Current conditions (JSON): {}\n\
             Return JSON with 'tasks' (array of objects), 'frequency' (string) and \
             'duration' (string).",
            subjects.join(", "),
            conditions_json(conditions)
        )
    }

    /// Call the Chat Completions API and return the message content
    async fn call_api(
        &self,
        prompt: String,
        schema: JsonSchema,
    ) -> std::result::Result<String, ProviderError> {
        let request_payload = ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage { role: "system".to_string(), content: SYSTEM_PROMPT.to_string() },
                ChatMessage { role: "user".to_string(), content: prompt },
            ],
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            response_format: ResponseFormat {
                format_type: "json_schema".to_string(),
                json_schema: Some(schema),
            },
        };

        let request_builder = self
            .http_client
            .request(Method::POST, &self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request_payload);

        let response = self.http_client.send(request_builder).await.map_err(|err| match err {
            GardenwiseError::Timeout(msg) => ProviderError::Network(format!("timeout: {msg}")),
            other => ProviderError::Network(other.to_string()),
        })?;

        let status = response.status();
        debug!(status = status.as_u16(), "Received recommendation provider response");

        if !status.is_success() {
            let message = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ProviderError::Status { status: status.as_u16(), message });
        }

        let chat_response: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Malformed(format!("Failed to parse response: {}", e)))?;

        if let Some(usage) = &chat_response.usage {
            debug!(tokens = usage.total_tokens, "Recommendation provider token usage");
        }

        chat_response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| ProviderError::Malformed("Response contained no choices".to_string()))
    }
}

#[async_trait]
impl RecommendationProvider for OpenAIProvider {
    async fn recommendations(
        &self,
        subject: &str,
        conditions: &Conditions,
    ) -> std::result::Result<Vec<String>, ProviderError> {
        let schema = JsonSchema {
            name: "garden_recommendations".to_string(),
            schema: json!({
                "type": "object",
                "properties": {
                    "recommendations": { "type": "array", "items": { "type": "string" } }
                },
                "required": ["recommendations"],
                "additionalProperties": false
            }),
            strict: Some(true),
        };

        let content =
            self.call_api(Self::recommendation_prompt(subject, conditions), schema).await?;
        let parsed: RecommendationContent = serde_json::from_str(&content).map_err(|e| {
            ProviderError::Malformed(format!(
                "Failed to parse recommendations: {}. Content: {}",
                e, content
            ))
        })?;
        Ok(parsed.recommendations)
    }

    async fn schedule(
        &self,
        conditions: &Conditions,
        subjects: &[String],
    ) -> std::result::Result<Value, ProviderError> {
        let schema = JsonSchema {
            name: "garden_care_plan".to_string(),
            schema: json!({
                "type": "object",
                "properties": {
                    "tasks": { "type": "array", "items": { "type": "object" } },
                    "frequency": { "type": "string" },
                    "duration": { "type": "string" }
                },
                "required": ["tasks", "frequency", "duration"]
            }),
            strict: None,
        };

        let content = self.call_api(Self::schedule_prompt(conditions, subjects), schema).await?;
        serde_json::from_str(&content).map_err(|e| {
            ProviderError::Malformed(format!(
                "Failed to parse care plan: {}. Content: {}",
                e, content
            ))
        })
    }
}

fn conditions_json(conditions: &Conditions) -> String {
    serde_json::to_string(conditions).unwrap_or_else(|_| "{}".to_string())
}
