//! Completion service for ragvault.
//!
//! Sends a single user prompt to an OpenAI-compatible chat completions
//! server (for example a local llama.cpp server) and returns generated
//! text or a JSON object. See [`CompletionClient`] for the fail-soft
//! contract.

/// Completion backend implementations.
pub mod backends;
/// The fail-soft client used by the gateway.
pub mod completion;
/// Model connection settings.
pub mod config;

pub use backends::{CompletionBackend, ResponseFormat};
pub use completion::CompletionClient;
pub use config::ModelConfig;
