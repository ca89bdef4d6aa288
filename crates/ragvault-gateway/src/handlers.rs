//! HTTP request handlers.

use crate::error::ApiError;
use crate::models::*;
use crate::server::AppState;
use crate::validate;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::{Extension, Json};
use ragvault_security::Claims;
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info, warn};

/// `GET /health`
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        service: "ragvault".to_string(),
        documents: state.retrieval.document_count().await,
    })
}

/// `POST /api/login`
pub async fn login(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<LoginResponse>, ApiError> {
    let body = validate::json_body(&headers, &body)?;
    let username = validate::required_text(&body, "username", &state.sanitizer)?;
    let password = validate::required_text(&body, "password", &state.sanitizer)?;

    if !state.credentials.matches(&username, &password) {
        warn!(
            username = %state.sanitizer.sanitize_header(&username),
            "Rejected login: invalid credentials"
        );
        return Err(ApiError::Unauthorized("Invalid credentials".to_string()));
    }

    let token = state.tokens.issue(&username).map_err(|e| {
        error!(error = %e, "Failed to issue token");
        ApiError::Internal
    })?;
    info!(user = %username, ttl_secs = state.tokens.ttl().as_secs(), "Issued token");
    Ok(Json(LoginResponse { token }))
}

/// `POST /api/complete`
pub async fn complete(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<CompleteResponse>, ApiError> {
    let body = validate::json_body(&headers, &body)?;
    let input = validate::required_text(&body, "input_string", &state.sanitizer)?;
    let output_json = validate::optional_bool(&body, "output_json")?;

    let response_string = if output_json {
        state.completion.complete_json(&input).await
    } else {
        Value::String(state.completion.complete_text(&input).await)
    };

    Ok(Json(CompleteResponse {
        response_string,
        user: claims.sub,
    }))
}

/// `POST /api/add_document`
pub async fn add_document(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<AddDocumentResponse>, ApiError> {
    let body = validate::json_body(&headers, &body)?;
    let (text, metadata) = validate::required_document(&body, "input_doc", &state.sanitizer)?;

    let id = state.retrieval.add_document(&text, &metadata).await?;
    let response_string = match id {
        Some(_) => "document added to vector database",
        None => "document already present",
    };

    Ok(Json(AddDocumentResponse {
        response_string: response_string.to_string(),
        id,
        user: claims.sub,
    }))
}

/// `POST /api/add_documents`
pub async fn add_documents(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<AddDocumentsResponse>, ApiError> {
    let body = validate::json_body(&headers, &body)?;
    let docs = validate::required_documents(&body, "input_docs", &state.sanitizer)?;

    let ids = state.retrieval.add_documents(docs).await?;
    let added = ids.iter().filter(|id| id.is_some()).count();

    Ok(Json(AddDocumentsResponse {
        added,
        skipped: ids.len() - added,
        ids,
        user: claims.sub,
    }))
}

/// `POST /api/query_similar_docs`
pub async fn query_similar_docs(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<QueryResponse>, ApiError> {
    let body = validate::json_body(&headers, &body)?;
    let input = validate::required_text(&body, "input_string", &state.sanitizer)?;
    let k = validate::num_docs(&body)?;

    let docs = state.retrieval.search(&input, k).await?;
    Ok(Json(QueryResponse {
        docs,
        user: claims.sub,
    }))
}

/// `POST /api/query_filtered_docs`
pub async fn query_filtered_docs(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<QueryResponse>, ApiError> {
    let body = validate::json_body(&headers, &body)?;
    let input = validate::required_text(&body, "input_string", &state.sanitizer)?;
    let filter_key = validate::required_text(&body, "filter_key", &state.sanitizer)?;
    let values = validate::filter_values(&body, "values", &state.sanitizer)?;
    let k = validate::num_docs(&body)?;

    let docs = state
        .retrieval
        .search_filtered(&input, &filter_key, &values, k)
        .await?;
    Ok(Json(QueryResponse {
        docs,
        user: claims.sub,
    }))
}

/// `POST /api/admin/save`
pub async fn admin_save(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<SaveResponse>, ApiError> {
    let saved = state.retrieval.save(&state.snapshot_path).await?;
    info!(
        user = %claims.sub,
        saved,
        path = %state.snapshot_path.display(),
        "Snapshot saved"
    );
    Ok(Json(SaveResponse { saved }))
}

/// `POST /api/admin/erase`
///
/// Disabled unless the server was started with erasing allowed, and even
/// then requires `{"confirm": true}`.
pub async fn admin_erase(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<EraseResponse>, ApiError> {
    if !state.allow_erase {
        warn!(user = %claims.sub, "Rejected erase: disabled by configuration");
        return Err(ApiError::Forbidden("Erase is disabled".to_string()));
    }
    let body = validate::json_body(&headers, &body)?;
    if body.get("confirm") != Some(&Value::Bool(true)) {
        return Err(ApiError::bad_request("confirm must be true"));
    }

    let erased = state.retrieval.document_count().await;
    state.retrieval.erase_all().await;
    warn!(user = %claims.sub, erased, "Erased all documents");
    Ok(Json(EraseResponse { erased }))
}
