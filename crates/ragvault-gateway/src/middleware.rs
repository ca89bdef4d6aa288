use crate::error::ApiError;
use crate::server::AppState;
use axum::{
    extract::{ConnectInfo, Request, State},
    http::header,
    middleware::Next,
    response::{IntoResponse, Response},
};
use ragvault_security::Claims;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::warn;

/// Auth middleware: requires `Authorization: Bearer <token>`.
///
/// On success the verified [`Claims`] are inserted as a request extension
/// for the rate limiter and handlers.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let header_value = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_string);

    let Some(header_value) = header_value else {
        warn!(path = %request.uri().path(), "Rejected request: missing token");
        return ApiError::Unauthorized("Missing token".to_string()).into_response();
    };

    let token = header_value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .unwrap_or_default();

    match state.tokens.verify(token) {
        Ok(claims) => {
            request.extensions_mut().insert(claims);
            next.run(request).await
        }
        Err(e) => {
            warn!(path = %request.uri().path(), reason = %e, "Rejected request");
            ApiError::Unauthorized(e.to_string()).into_response()
        }
    }
}

/// Rate limiting middleware for authenticated routes, keyed by user.
pub async fn rate_limit_middleware(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let user = request
        .extensions()
        .get::<Claims>()
        .map(|c| c.sub.clone())
        .unwrap_or_else(|| "anonymous".to_string());

    if !state.api_limiter.check(&user).await {
        warn!(user = %state.sanitizer.sanitize_header(&user), "Rate limited request");
        return ApiError::TooManyRequests.into_response();
    }

    next.run(request).await
}

/// Rate limiting middleware for the login route, keyed by client address.
pub async fn login_rate_limit_middleware(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let client = client_ip(&request);
    if !state.login_limiter.check(&client).await {
        warn!(client = %client, "Rate limited login attempt");
        return ApiError::TooManyRequests.into_response();
    }
    next.run(request).await
}

/// Peer IP from the connection, or `unknown` when the server was not built
/// with connect info (for example in tests).
pub fn client_ip(request: &Request) -> String {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}
