use std::fmt;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};
use walks_core::{RecommendationError, RecommendationRequest, RecommenderSettings, Selection};

use crate::prompt::{system_prompt, user_prompt};
use crate::Recommender;

/// Client for an OpenAI-compatible `chat/completions` endpoint.
#[derive(Clone)]
pub struct ChatCompletionsRecommender {
    http_client: Client,
    endpoint: String,
    api_token: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
    timeout: Duration,
    city_name: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SelectionEnvelope {
    selected_places: Vec<Selection>,
}

impl fmt::Debug for ChatCompletionsRecommender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatCompletionsRecommender")
            .field("endpoint", &self.endpoint)
            .field("api_token", &"<redacted>")
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl ChatCompletionsRecommender {
    pub fn new(settings: &RecommenderSettings, city_name: &str, api_token: String) -> Result<Self> {
        let timeout = Duration::from_secs(settings.timeout_secs.max(1));
        let http_client = Client::builder()
            .connect_timeout(Duration::from_secs(6).min(timeout))
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            http_client,
            endpoint: format!("{}/chat/completions", settings.base_url.trim_end_matches('/')),
            api_token,
            model: settings.model.clone(),
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
            timeout,
            city_name: city_name.to_string(),
        })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn payload(&self, request: &RecommendationRequest) -> serde_json::Value {
        serde_json::json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": system_prompt(&self.city_name) },
                { "role": "user", "content": user_prompt(request, &self.city_name) }
            ],
            "temperature": self.temperature,
            "max_tokens": self.max_tokens,
            "response_format": { "type": "json_object" }
        })
    }
}

impl Recommender for ChatCompletionsRecommender {
    fn backend_name(&self) -> &'static str {
        "chat-completions"
    }

    async fn recommend(
        &self,
        request: &RecommendationRequest,
    ) -> Result<Vec<Selection>, RecommendationError> {
        let response = self
            .http_client
            .post(self.endpoint.as_str())
            .bearer_auth(self.api_token.as_str())
            .json(&self.payload(request))
            .send()
            .await
            .map_err(|error| {
                if error.is_timeout() {
                    RecommendationError::Timeout(self.timeout)
                } else {
                    RecommendationError::Unreachable(error.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "recommender returned non-success status");
            return Err(RecommendationError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: ChatCompletionResponse = response.json().await.map_err(|error| {
            if error.is_timeout() {
                RecommendationError::Timeout(self.timeout)
            } else {
                RecommendationError::Malformed(format!("completion envelope: {error}"))
            }
        })?;

        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| RecommendationError::Malformed("completion has no content".to_string()))?;
        debug!(chars = content.len(), "recommender content received");

        parse_selections(&content)
    }
}

/// Parses the model's message content. Only `{"selected_places": [...]}` is
/// accepted; an empty list is a valid (if short) answer, a missing key is not.
pub fn parse_selections(content: &str) -> Result<Vec<Selection>, RecommendationError> {
    let envelope: SelectionEnvelope = serde_json::from_str(content.trim())
        .map_err(|error| RecommendationError::Malformed(format!("selection json: {error}")))?;
    Ok(envelope.selected_places)
}
