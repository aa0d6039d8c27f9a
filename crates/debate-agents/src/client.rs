//! Completion client — the only boundary to the text-generation service.
//!
//! Agents and the judge talk to a [`CompletionClient`]; the production
//! implementation speaks the OpenAI-compatible chat-completions protocol
//! (Groq by default). Tests substitute scripted clients.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::config::EndpointConfig;

/// Request timeout for a single completion call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Who authored a conversation message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    System,
    Human,
    Ai,
}

impl Role {
    /// Role name on the chat-completions wire.
    pub fn api_name(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::Human => "user",
            Self::Ai => "assistant",
        }
    }
}

/// One role-tagged message of a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn human(content: impl Into<String>) -> Self {
        Self {
            role: Role::Human,
            content: content.into(),
        }
    }

    pub fn ai(content: impl Into<String>) -> Self {
        Self {
            role: Role::Ai,
            content: content.into(),
        }
    }
}

/// A full completion request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    /// Sampling temperature, 0.0–1.0.
    pub temperature: f32,
    /// Forwarded to the service when the run is seeded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

/// Failure of a single completion call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompletionError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("rate limited (retry after {retry_after:?})")]
    RateLimited { retry_after: Option<Duration> },

    #[error("service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("service returned an empty completion")]
    EmptyCompletion,

    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

/// Text-generation service.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Generate text for the conversation. May return empty text; callers
    /// decide what counts as usable.
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError>;
}

/// OpenAI-compatible chat-completions client.
pub struct OpenAiCompatibleClient {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl OpenAiCompatibleClient {
    pub fn new(endpoint: &EndpointConfig) -> Result<Self, CompletionError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| CompletionError::Transport(e.to_string()))?;
        Ok(Self {
            base_url: endpoint.url.trim_end_matches('/').to_string(),
            api_key: endpoint.api_key.clone(),
            client,
        })
    }

    fn request_body(request: &CompletionRequest) -> serde_json::Value {
        let messages: Vec<serde_json::Value> = request
            .messages
            .iter()
            .map(|m| serde_json::json!({ "role": m.role.api_name(), "content": m.content }))
            .collect();

        let mut body = serde_json::json!({
            "model": request.model,
            "messages": messages,
            "temperature": request.temperature,
        });
        if let Some(seed) = request.seed {
            body["seed"] = serde_json::json!(seed);
        }
        body
    }
}

#[async_trait]
impl CompletionClient for OpenAiCompatibleClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
        let start = std::time::Instant::now();
        let url = format!("{}/chat/completions", self.base_url);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&Self::request_body(request))
            .send()
            .await
            .map_err(|e| CompletionError::Transport(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .map(Duration::from_secs);
            return Err(CompletionError::RateLimited { retry_after });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CompletionError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let resp_json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| CompletionError::MalformedResponse(e.to_string()))?;

        let content = parse_content(&resp_json)?;
        debug!(
            model = %request.model,
            chars = content.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Completion received"
        );
        Ok(content)
    }
}

/// Pull `choices[0].message.content` out of a chat-completions response.
fn parse_content(resp_json: &serde_json::Value) -> Result<String, CompletionError> {
    let message = resp_json["choices"][0]["message"]
        .as_object()
        .ok_or_else(|| {
            CompletionError::MalformedResponse("response has no choices[0].message".to_string())
        })?;
    match message.get("content") {
        Some(serde_json::Value::String(content)) => Ok(content.clone()),
        Some(serde_json::Value::Null) | None => Ok(String::new()),
        Some(other) => Err(CompletionError::MalformedResponse(format!(
            "content is not a string: {}",
            other
        ))),
    }
}
