use crate::metadata::Metadata;
use crate::store::{DocumentStore, ScoredDocument};
use ragvault_core::RagError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;
use std::sync::Arc;
use tracing::error;
use uuid::Uuid;

/// Failure signal crossing the retrieval boundary.
///
/// Deliberately carries no detail; the cause is logged where it is caught.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RetrievalError {
    /// Embedding, store or persistence failure.
    #[error("internal error")]
    Internal,
}

/// One search result in the shape the gateway returns to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Record id.
    pub id: Uuid,
    /// Stored text.
    pub text: String,
    /// Stored (string-coerced) metadata.
    pub metadata: Metadata,
    /// Cosine similarity to the query.
    pub similarity: f32,
    /// Euclidean distance to the query.
    pub distance: f32,
}

impl From<ScoredDocument> for SearchHit {
    fn from(doc: ScoredDocument) -> Self {
        Self {
            id: doc.record.id,
            text: doc.record.text,
            metadata: doc.record.metadata,
            similarity: doc.similarity,
            distance: doc.distance,
        }
    }
}

/// Orchestrates the document store for the gateway.
///
/// Converts raw JSON metadata into [`Metadata`], shapes results as
/// [`SearchHit`]s and turns every underlying error into
/// [`RetrievalError::Internal`] after logging it.
pub struct RetrievalService {
    store: Arc<DocumentStore>,
}

impl RetrievalService {
    /// Wrap an existing store.
    pub fn new(store: Arc<DocumentStore>) -> Self {
        Self { store }
    }

    /// The wrapped store.
    pub fn store(&self) -> &Arc<DocumentStore> {
        &self.store
    }

    /// Number of stored documents.
    pub async fn document_count(&self) -> usize {
        self.store.len().await
    }

    /// Add one document. `Ok(None)` means the text was already stored.
    pub async fn add_document(
        &self,
        text: &str,
        metadata: &Map<String, Value>,
    ) -> Result<Option<Uuid>, RetrievalError> {
        self.store
            .insert(text, Metadata::coerce(metadata))
            .await
            .map_err(|e| internal("add_document", e))
    }

    /// Add documents in order; one entry per input, `None` for skipped duplicates.
    pub async fn add_documents(
        &self,
        documents: Vec<(String, Map<String, Value>)>,
    ) -> Result<Vec<Option<Uuid>>, RetrievalError> {
        let coerced = documents
            .into_iter()
            .map(|(text, raw)| (text, Metadata::coerce(&raw)));
        self.store
            .insert_many(coerced)
            .await
            .map_err(|e| internal("add_documents", e))
    }

    /// Nearest neighbours of `text`.
    pub async fn search(&self, text: &str, k: usize) -> Result<Vec<SearchHit>, RetrievalError> {
        self.store
            .query(text, k)
            .await
            .map(into_hits)
            .map_err(|e| internal("search", e))
    }

    /// Nearest neighbours of `text` among records whose `key` matches one of `values`.
    pub async fn search_filtered(
        &self,
        text: &str,
        key: &str,
        values: &[String],
        k: usize,
    ) -> Result<Vec<SearchHit>, RetrievalError> {
        self.store
            .query_filtered(text, key, values, k)
            .await
            .map(into_hits)
            .map_err(|e| internal("search_filtered", e))
    }

    /// Drop every document. Callers gate this behind explicit authorization.
    pub async fn erase_all(&self) {
        self.store.erase_all().await;
    }

    /// Persist the store to `path`; returns the number of records written.
    pub async fn save(&self, path: &Path) -> Result<usize, RetrievalError> {
        self.store.save(path).await.map_err(|e| internal("save", e))
    }

    /// Replace the store with the snapshot at `path`.
    pub async fn load(&self, path: &Path) -> Result<usize, RetrievalError> {
        self.store.load(path).await.map_err(|e| internal("load", e))
    }
}

fn into_hits(docs: Vec<ScoredDocument>) -> Vec<SearchHit> {
    docs.into_iter().map(SearchHit::from).collect()
}

fn internal(operation: &str, err: RagError) -> RetrievalError {
    error!(operation, error = %err, "Retrieval operation failed");
    RetrievalError::Internal
}
