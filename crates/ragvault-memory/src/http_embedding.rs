use crate::embedding::EmbeddingProvider;
use async_trait::async_trait;
use ragvault_core::{RagError, RagResult};
use std::time::Duration;
use tracing::debug;

/// Embedding provider backed by an OpenAI-compatible `/v1/embeddings` endpoint.
///
/// Works with a local llama.cpp server, Ollama, or any hosted service that
/// speaks the same contract.
pub struct HttpEmbedding {
    base_url: String,
    model: String,
    api_key: Option<String>,
    dimension: usize,
    http: reqwest::Client,
}

impl HttpEmbedding {
    /// Create a provider for `model` at `base_url` producing `dimension`-long vectors.
    pub fn new(base_url: impl Into<String>, model: impl Into<String>, dimension: usize) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key: None,
            dimension,
            http,
        }
    }

    /// Send `Authorization: Bearer <key>` with every request.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        let key = api_key.into();
        self.api_key = (!key.is_empty()).then_some(key);
        self
    }
}

#[async_trait]
impl EmbeddingProvider for HttpEmbedding {
    async fn embed(&self, text: &str) -> RagResult<Vec<f32>> {
        let url = format!("{}/v1/embeddings", self.base_url);
        let body = serde_json::json!({
            "model": self.model,
            "input": text,
        });

        let mut request = self.http.post(&url).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let resp = request
            .send()
            .await
            .map_err(|e| RagError::Embedding(format!("request to {url} failed: {e}")))?;

        let status = resp.status();
        let resp_body: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| RagError::Embedding(format!("unreadable response: {e}")))?;

        if !status.is_success() {
            return Err(RagError::Embedding(format!(
                "embedding API error {status}: {resp_body}"
            )));
        }

        let values = resp_body["data"][0]["embedding"]
            .as_array()
            .ok_or_else(|| RagError::Embedding("response has no data[0].embedding".to_string()))?;

        let vector = values
            .iter()
            .map(|v| v.as_f64().map(|f| f as f32))
            .collect::<Option<Vec<f32>>>()
            .ok_or_else(|| RagError::Embedding("embedding contains non-numeric values".to_string()))?;

        if vector.len() != self.dimension {
            return Err(RagError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }

        debug!(model = %self.model, dimension = vector.len(), "Embedded text via HTTP");
        Ok(vector)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
