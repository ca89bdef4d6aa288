//! Response data transfer objects for the REST API.

use ragvault_memory::SearchHit;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Response for `GET /health`.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `ok` while the process serves requests.
    pub status: String,
    /// Service name.
    pub service: String,
    /// Documents currently stored.
    pub documents: usize,
}

/// Response for `POST /api/login`.
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    /// Bearer token for the `Authorization` header.
    pub token: String,
}

/// Response for `POST /api/complete`.
///
/// `response_string` is a JSON string in text mode and a JSON object in
/// `output_json` mode.
#[derive(Debug, Serialize, Deserialize)]
pub struct CompleteResponse {
    /// Model output.
    pub response_string: serde_json::Value,
    /// Authenticated user.
    pub user: String,
}

/// Response for `POST /api/add_document`.
#[derive(Debug, Serialize, Deserialize)]
pub struct AddDocumentResponse {
    /// Human-readable outcome.
    pub response_string: String,
    /// `None` when the text was already stored.
    pub id: Option<Uuid>,
    /// Authenticated user.
    pub user: String,
}

/// Response for `POST /api/add_documents`.
#[derive(Debug, Serialize, Deserialize)]
pub struct AddDocumentsResponse {
    /// Documents stored.
    pub added: usize,
    /// Duplicates ignored.
    pub skipped: usize,
    /// One entry per submitted document, in order.
    pub ids: Vec<Option<Uuid>>,
    /// Authenticated user.
    pub user: String,
}

/// Response for the query endpoints.
#[derive(Debug, Serialize, Deserialize)]
pub struct QueryResponse {
    /// Hits, most similar first.
    pub docs: Vec<SearchHit>,
    /// Authenticated user.
    pub user: String,
}

/// Response for `POST /api/admin/save`.
#[derive(Debug, Serialize, Deserialize)]
pub struct SaveResponse {
    /// Records written.
    pub saved: usize,
}

/// Response for `POST /api/admin/erase`.
#[derive(Debug, Serialize, Deserialize)]
pub struct EraseResponse {
    /// Records removed.
    pub erased: usize,
}
