use async_trait::async_trait;
use genai::Client;
use genai::chat::{ChatMessage, ChatOptions, ChatRequest};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use super::error::LlmError;
use crate::config::LlmModel;

/// One chat completion call.
#[derive(Debug, Clone, PartialEq)]
pub struct LlmRequest {
    pub system: Option<String>,
    pub prompt: String,
    pub temperature: f64,
    pub max_tokens: u32,
}

impl LlmRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            system: None,
            prompt: prompt.into(),
            temperature: 0.3,
            max_tokens: 256,
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

/// Chat-completion backend.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Returns the completion text. Empty completions are an error.
    async fn complete(&self, request: &LlmRequest) -> Result<String, LlmError>;
}

/// Parses a JSON completion, tolerating Markdown code fences and surrounding prose.
pub fn parse_json_response<T: DeserializeOwned>(text: &str) -> Result<T, LlmError> {
    let trimmed = text.trim();
    if let Ok(value) = serde_json::from_str(trimmed) {
        return Ok(value);
    }

    let start = trimmed.find(['{', '[']);
    let end = trimmed.rfind(['}', ']']);
    match (start, end) {
        (Some(start), Some(end)) if end > start => serde_json::from_str(&trimmed[start..=end])
            .map_err(|e| LlmError::InvalidResponse {
                reason: e.to_string(),
            }),
        _ => Err(LlmError::InvalidResponse {
            reason: "no JSON value in response".to_string(),
        }),
    }
}

/// [`LlmProvider`] backed by the `genai` multi-provider client.
///
/// Provider credentials are read by `genai` from the usual environment variables
/// (`OPENAI_API_KEY`, `ANTHROPIC_API_KEY`, ...), keyed by the model name.
pub struct GenaiProvider {
    client: Client,
    model: LlmModel,
}

impl GenaiProvider {
    pub fn new(model: LlmModel) -> Self {
        Self {
            client: Client::default(),
            model,
        }
    }

    pub fn model(&self) -> &LlmModel {
        &self.model
    }
}

impl std::fmt::Debug for GenaiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenaiProvider")
            .field("model", &self.model.as_str())
            .finish()
    }
}

#[async_trait]
impl LlmProvider for GenaiProvider {
    fn name(&self) -> &str {
        self.model.as_str()
    }

    #[instrument(skip(self, request), fields(model = %self.model.as_str(), max_tokens = request.max_tokens))]
    async fn complete(&self, request: &LlmRequest) -> Result<String, LlmError> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &request.system {
            messages.push(ChatMessage::system(system.clone()));
        }
        messages.push(ChatMessage::user(request.prompt.clone()));

        let options = ChatOptions::default()
            .with_temperature(request.temperature)
            .with_max_tokens(request.max_tokens);

        let response = self
            .client
            .exec_chat(self.model.as_str(), ChatRequest::new(messages), Some(&options))
            .await
            .map_err(|e| LlmError::classify(&e.to_string()))?;

        let text = response.first_text().unwrap_or_default().trim().to_string();
        debug!(chars = text.len(), "LLM completion received");
        if text.is_empty() {
            return Err(LlmError::EmptyResponse);
        }
        Ok(text)
    }
}
