/// OpenAI-compatible `/v1/chat/completions` backend.
pub mod openai;

use async_trait::async_trait;
use ragvault_core::RagResult;

/// Output mode requested from the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFormat {
    /// Free-form text.
    Text,
    /// A single JSON object.
    Json,
}

impl ResponseFormat {
    /// Value of `response_format.type` in the chat completions request.
    pub fn as_str(self) -> &'static str {
        match self {
            ResponseFormat::Text => "text",
            ResponseFormat::Json => "json_object",
        }
    }
}

/// Trait for completion backends.
///
/// Backends report failures as errors; [`CompletionClient`](crate::CompletionClient)
/// decides what callers see.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Generate a completion for a single user prompt.
    async fn complete(&self, prompt: &str, format: ResponseFormat) -> RagResult<String>;
}
