use serde::{Deserialize, Serialize};

/// Connection and sampling settings for the completion backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Root of the OpenAI-compatible server, without the `/v1` suffix.
    pub base_url: String,
    /// Model name sent with every request.
    pub model_id: String,
    /// Bearer key; local servers usually need none.
    pub api_key: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Upper bound on generated tokens.
    pub max_tokens: u32,
    /// Whole-request timeout. Local models can be slow on first load.
    pub timeout_secs: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080".to_string(),
            model_id: "local-model".to_string(),
            api_key: String::new(),
            temperature: 0.7,
            max_tokens: 512,
            timeout_secs: 120,
        }
    }
}

impl ModelConfig {
    /// `base_url` with any trailing slash removed.
    pub fn base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}
