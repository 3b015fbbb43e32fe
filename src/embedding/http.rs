use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::{EmbeddingError, EmbeddingProvider, normalize};
use crate::config::EmbeddingConfig;

/// Client for an OpenAI-compatible `POST {endpoint}/embeddings` API.
///
/// One attempt per call. Retry and circuit breaking are applied by the caller, which uses
/// [`EmbeddingError::category`] to decide: 429, 5xx and network errors are transient, 401/403
/// and other 4xx are permanent.
pub struct HttpEmbeddingProvider {
    client: reqwest::Client,
    url: String,
    model: String,
    api_key: Option<String>,
    dimension: usize,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingDatum>,
}

#[derive(Deserialize)]
struct EmbeddingDatum {
    embedding: Vec<f32>,
    #[serde(default)]
    index: Option<usize>,
}

impl HttpEmbeddingProvider {
    pub fn new(config: &EmbeddingConfig) -> Result<Self, EmbeddingError> {
        let endpoint = config
            .endpoint
            .as_deref()
            .filter(|e| !e.trim().is_empty())
            .ok_or_else(|| EmbeddingError::InvalidConfig {
                reason: "embedding endpoint is not set".to_string(),
            })?;

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| EmbeddingError::InvalidConfig {
                reason: e.to_string(),
            })?;

        Ok(Self {
            client,
            url: format!("{}/embeddings", endpoint.trim_end_matches('/')),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
            dimension: config.dimension,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn classify_status(status: reqwest::StatusCode, body: String) -> EmbeddingError {
        match status.as_u16() {
            429 => EmbeddingError::RateLimited,
            401 | 403 => EmbeddingError::Unauthorized {
                status: status.as_u16(),
            },
            code if status.is_server_error() => EmbeddingError::Server { status: code, body },
            code => EmbeddingError::Rejected { status: code, body },
        }
    }

    fn parse_response(
        &self,
        response: EmbeddingResponse,
        expected: usize,
    ) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if response.data.len() != expected {
            return Err(EmbeddingError::InvalidResponse {
                reason: format!(
                    "expected {} embeddings, got {}",
                    expected,
                    response.data.len()
                ),
            });
        }

        let mut data = response.data;
        if data.iter().all(|d| d.index.is_some()) {
            data.sort_by_key(|d| d.index);
        }

        data.into_iter()
            .map(|datum| {
                let mut vector = datum.embedding;
                if vector.len() != self.dimension {
                    return Err(EmbeddingError::DimensionMismatch {
                        expected: self.dimension,
                        actual: vector.len(),
                    });
                }
                normalize(&mut vector);
                Ok(vector)
            })
            .collect()
    }
}

impl std::fmt::Debug for HttpEmbeddingProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpEmbeddingProvider")
            .field("url", &self.url)
            .field("model", &self.model)
            .field("has_api_key", &self.api_key.is_some())
            .field("dimension", &self.dimension)
            .finish()
    }
}

#[async_trait]
impl EmbeddingProvider for HttpEmbeddingProvider {
    fn name(&self) -> &'static str {
        "http"
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn encode(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut vectors = self.encode_batch(&[text.to_string()]).await?;
        vectors.pop().ok_or_else(|| EmbeddingError::InvalidResponse {
            reason: "empty embedding response".to_string(),
        })
    }

    #[instrument(skip(self, texts), fields(url = %self.url, count = texts.len()))]
    async fn encode_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut request = self
            .client
            .post(&self.url)
            .json(&EmbeddingRequest {
                model: &self.model,
                input: texts,
            });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            debug!(status = status.as_u16(), "Embedding request failed");
            return Err(Self::classify_status(status, body));
        }

        let parsed: EmbeddingResponse = response.json().await?;
        self.parse_response(parsed, texts.len())
    }
}
