//! API error types mapped to HTTP status codes.
//!
//! Bodies are `{"error": "message"}`, except 401 responses which use
//! `{"message": "..."}` so existing clients keep parsing them.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use ragvault_memory::RetrievalError;
use serde_json::json;

/// Body of every 500 response. Causes are logged, never returned.
pub const INTERNAL_MESSAGE: &str = "Internal server error";

/// Application-level error type that implements `IntoResponse`.
///
/// - `BadRequest` → 400
/// - `Unauthorized` → 401
/// - `Forbidden` → 403
/// - `TooManyRequests` → 429
/// - `Internal` → 500
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Malformed request shape (400).
    BadRequest(String),
    /// Missing, expired or invalid token, or bad credentials (401).
    Unauthorized(String),
    /// Operation disabled by configuration (403).
    Forbidden(String),
    /// Rate limit exceeded (429).
    TooManyRequests,
    /// Unexpected server error (500).
    Internal,
}

impl ApiError {
    /// Shorthand for [`ApiError::BadRequest`].
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }
}

impl From<RetrievalError> for ApiError {
    fn from(_: RetrievalError) -> Self {
        ApiError::Internal
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, json!({ "message": msg })),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, json!({ "error": msg })),
            ApiError::TooManyRequests => (
                StatusCode::TOO_MANY_REQUESTS,
                json!({ "error": "Rate limit exceeded" }),
            ),
            ApiError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": INTERNAL_MESSAGE }),
            ),
        };
        (status, axum::Json(body)).into_response()
    }
}
