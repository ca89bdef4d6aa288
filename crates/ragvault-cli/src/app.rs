//! Wiring: builds the embedder, store, services and gateway state from config.

use crate::config::{EmbeddingConfig, EmbeddingProviderKind, RagvaultConfig};
use ragvault_agent::CompletionClient;
use ragvault_core::RagResult;
use ragvault_gateway::AppState;
use ragvault_memory::{
    DocumentStore, EmbeddingProvider, HttpEmbedding, LocalEmbedding, RetrievalService,
};
use ragvault_security::{Credentials, RateLimiter, Sanitizer, TokenIssuer};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Build the configured embedder.
pub fn build_embedder(config: &EmbeddingConfig) -> Arc<dyn EmbeddingProvider> {
    match config.provider {
        EmbeddingProviderKind::Local => Arc::new(LocalEmbedding::new(config.dimension)),
        EmbeddingProviderKind::Http => {
            let mut embedder =
                HttpEmbedding::new(&config.base_url, &config.model, config.dimension);
            if !config.api_key.is_empty() {
                embedder = embedder.with_api_key(&config.api_key);
            }
            Arc::new(embedder)
        }
    }
}

/// Build the document store and load the snapshot if one exists.
///
/// A snapshot that exists but fails to load is an error; starting empty
/// would silently drop the corpus on the next save.
pub async fn build_store(config: &RagvaultConfig) -> RagResult<Arc<DocumentStore>> {
    let store = DocumentStore::new(build_embedder(&config.memory.embedding));
    let path = &config.memory.snapshot_path;
    if tokio::fs::try_exists(path).await? {
        let count = store.load(path).await?;
        info!(path = %path.display(), count, "Snapshot loaded");
    } else {
        info!(path = %path.display(), "No snapshot found, starting empty");
    }
    Ok(Arc::new(store))
}

/// Build the shared gateway state.
pub fn build_state(config: &RagvaultConfig, store: Arc<DocumentStore>) -> RagResult<Arc<AppState>> {
    let security = &config.security;
    let tokens = TokenIssuer::new(
        security.secret_key.as_bytes(),
        Duration::from_secs(security.token_ttl_secs),
    )?;
    let completion = CompletionClient::new(config.model.clone())?;

    Ok(Arc::new(AppState {
        retrieval: Arc::new(RetrievalService::new(store)),
        completion: Arc::new(completion),
        tokens,
        credentials: Credentials::new(&security.username, &security.password),
        login_limiter: RateLimiter::per_minute(security.login_per_minute),
        api_limiter: RateLimiter::per_minute(security.api_per_minute),
        sanitizer: Sanitizer::new(security.max_input_chars),
        snapshot_path: config.memory.snapshot_path.clone(),
        allow_erase: security.allow_erase,
    }))
}
