use super::{CompletionBackend, ResponseFormat};
use crate::config::ModelConfig;
use async_trait::async_trait;
use ragvault_core::{RagError, RagResult};
use std::time::Duration;

/// OpenAI-compatible chat completions backend.
///
/// Works with llama.cpp's server, Ollama, vLLM and any other server that
/// implements `POST /v1/chat/completions`.
pub struct OpenAiBackend {
    config: ModelConfig,
    http: reqwest::Client,
}

impl OpenAiBackend {
    /// Build the backend with an HTTP client using `config.timeout_secs`.
    pub fn new(config: ModelConfig) -> RagResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| RagError::Http(e.to_string()))?;
        Ok(Self { config, http })
    }

    fn build_body(&self, prompt: &str, format: ResponseFormat) -> serde_json::Value {
        serde_json::json!({
            "model": self.config.model_id,
            "messages": [{"role": "user", "content": prompt}],
            "max_tokens": self.config.max_tokens,
            "temperature": self.config.temperature,
            "response_format": {"type": format.as_str()},
        })
    }
}

#[async_trait]
impl CompletionBackend for OpenAiBackend {
    async fn complete(&self, prompt: &str, format: ResponseFormat) -> RagResult<String> {
        let url = format!("{}/v1/chat/completions", self.config.base_url());

        let mut request = self
            .http
            .post(&url)
            .header("Content-Type", "application/json");
        if !self.config.api_key.is_empty() {
            request = request.header("Authorization", format!("Bearer {}", self.config.api_key));
        }

        let resp = request
            .json(&self.build_body(prompt, format))
            .send()
            .await
            .map_err(|e| RagError::Http(e.to_string()))?;

        let status = resp.status();
        let resp_body: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| RagError::Http(e.to_string()))?;

        if !status.is_success() {
            return Err(RagError::Completion(format!(
                "completion API error {status}: {resp_body}"
            )));
        }

        parse_completion(&resp_body)
    }
}

/// Extract `choices[0].message.content` from a chat completions response.
pub fn parse_completion(body: &serde_json::Value) -> RagResult<String> {
    body["choices"][0]["message"]["content"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| RagError::Completion("response has no message content".to_string()))
}
