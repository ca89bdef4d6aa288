use crate::handlers;
use crate::middleware::{auth_middleware, login_rate_limit_middleware, rate_limit_middleware};
use axum::{
    middleware as axum_mw,
    routing::{get, post},
    Router,
};
use ragvault_agent::CompletionClient;
use ragvault_memory::RetrievalService;
use ragvault_security::{Credentials, RateLimiter, Sanitizer, TokenIssuer};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;

/// Shared application state.
pub struct AppState {
    /// Document retrieval.
    pub retrieval: Arc<RetrievalService>,
    /// Text and JSON completion.
    pub completion: Arc<CompletionClient>,
    /// Bearer token issuer and verifier.
    pub tokens: TokenIssuer,
    /// The account accepted by `/api/login`.
    pub credentials: Credentials,
    /// Per-client-address limiter for `/api/login`.
    pub login_limiter: RateLimiter,
    /// Per-user limiter for authenticated routes.
    pub api_limiter: RateLimiter,
    /// Input length and character policy.
    pub sanitizer: Sanitizer,
    /// Target of `/api/admin/save`.
    pub snapshot_path: PathBuf,
    /// Whether `/api/admin/erase` is enabled.
    pub allow_erase: bool,
}

/// The main gateway server.
pub struct GatewayServer;

impl GatewayServer {
    /// Build the router.
    ///
    /// `/health` is open, `/api/login` is limited per client address, and
    /// every other `/api` route goes through auth and then the per-user
    /// limiter.
    pub fn build(state: Arc<AppState>) -> Router {
        let protected = Router::new()
            .route("/api/complete", post(handlers::complete))
            .route("/api/add_document", post(handlers::add_document))
            .route("/api/add_documents", post(handlers::add_documents))
            .route("/api/query_similar_docs", post(handlers::query_similar_docs))
            .route("/api/query_filtered_docs", post(handlers::query_filtered_docs))
            .route("/api/admin/save", post(handlers::admin_save))
            .route("/api/admin/erase", post(handlers::admin_erase))
            // The last layer added runs first: auth, then rate limiting.
            .layer(axum_mw::from_fn_with_state(
                state.clone(),
                rate_limit_middleware,
            ))
            .layer(axum_mw::from_fn_with_state(state.clone(), auth_middleware));

        let login = Router::new()
            .route("/api/login", post(handlers::login))
            .layer(axum_mw::from_fn_with_state(
                state.clone(),
                login_rate_limit_middleware,
            ));

        Router::new()
            .route("/health", get(handlers::health))
            .merge(login)
            .merge(protected)
            .with_state(state)
    }

    /// Periodically drop idle rate-limiter buckets.
    pub fn spawn_limiter_cleanup(state: Arc<AppState>, every: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            loop {
                interval.tick().await;
                state.login_limiter.cleanup(every).await;
                state.api_limiter.cleanup(every).await;
                debug!("Rate limiter buckets cleaned up");
            }
        })
    }
}
