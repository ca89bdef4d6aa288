use crate::backends::openai::OpenAiBackend;
use crate::backends::{CompletionBackend, ResponseFormat};
use crate::config::ModelConfig;
use ragvault_core::RagResult;
use serde_json::Value;
use tracing::{debug, warn};

/// Completion client handed to the gateway.
///
/// Fail-soft: backend errors never reach the caller. `complete_text` falls
/// back to `""` and `complete_json` to `{}`; the cause is logged at `warn`.
pub struct CompletionClient {
    backend: Box<dyn CompletionBackend>,
}

impl CompletionClient {
    /// Client backed by an [`OpenAiBackend`] for `config`.
    pub fn new(config: ModelConfig) -> RagResult<Self> {
        Ok(Self {
            backend: Box::new(OpenAiBackend::new(config)?),
        })
    }

    /// Create from a pre-built backend.
    pub fn from_backend(backend: Box<dyn CompletionBackend>) -> Self {
        Self { backend }
    }

    /// Generated text, or `""` on failure.
    pub async fn complete_text(&self, prompt: &str) -> String {
        match self.backend.complete(prompt, ResponseFormat::Text).await {
            Ok(text) => {
                debug!(chars = text.len(), "Completion received");
                text
            }
            Err(e) => {
                warn!(error = %e, "Text completion failed, returning empty string");
                String::new()
            }
        }
    }

    /// Generated JSON, or `{}` when the call fails or the output does not parse.
    pub async fn complete_json(&self, prompt: &str) -> Value {
        let text = match self.backend.complete(prompt, ResponseFormat::Json).await {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "JSON completion failed, returning empty object");
                return empty_object();
            }
        };
        match serde_json::from_str(text.trim()) {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, "Model output is not valid JSON, returning empty object");
                empty_object()
            }
        }
    }
}

fn empty_object() -> Value {
    Value::Object(serde_json::Map::new())
}
