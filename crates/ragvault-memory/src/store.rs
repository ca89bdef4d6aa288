use crate::embedding::EmbeddingProvider;
use crate::filter::MetadataFilter;
use crate::metadata::Metadata;
use crate::snapshot;
use ragvault_core::{RagError, RagResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// A single document held by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    /// Generated at insertion, never reused.
    pub id: Uuid,
    /// Raw text; unique within the store.
    pub text: String,
    /// Embedding of `text`, computed once at insertion.
    pub vector: Vec<f32>,
    /// String-coerced metadata.
    pub metadata: Metadata,
}

/// A record returned by a similarity query.
#[derive(Debug, Clone)]
pub struct ScoredDocument {
    /// The matching record.
    pub record: DocumentRecord,
    /// Cosine similarity to the query; the ranking key.
    pub similarity: f32,
    /// Euclidean distance to the query; reported only.
    pub distance: f32,
}

#[derive(Default)]
struct Records {
    rows: Vec<DocumentRecord>,
    texts: HashSet<String>,
}

impl Records {
    fn from_rows(rows: Vec<DocumentRecord>) -> Self {
        let texts = rows.iter().map(|r| r.text.clone()).collect();
        Self { rows, texts }
    }
}

/// In-memory document store with brute-force similarity search.
///
/// Records are kept in insertion order behind one `RwLock`. Queries scan
/// every vector (O(n)), which is fine for hundreds to a few thousand
/// documents.
///
/// Text is the natural key: inserting a text that is already present is a
/// no-op that returns `None`. Comparison is exact and case-sensitive.
pub struct DocumentStore {
    embedder: Arc<dyn EmbeddingProvider>,
    records: RwLock<Records>,
}

impl DocumentStore {
    /// Create an empty store whose vectors come from `embedder`.
    pub fn new(embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            embedder,
            records: RwLock::new(Records::default()),
        }
    }

    /// Length of every vector in this store.
    pub fn dimension(&self) -> usize {
        self.embedder.dimension()
    }

    /// Number of stored records.
    pub async fn len(&self) -> usize {
        self.records.read().await.rows.len()
    }

    /// True if the store holds no records.
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.rows.is_empty()
    }

    /// Clone of every record, in insertion order.
    pub async fn records(&self) -> Vec<DocumentRecord> {
        self.records.read().await.rows.clone()
    }

    /// Insert a document.
    ///
    /// Returns `Ok(None)` without embedding anything if a record with the
    /// exact same text exists. Otherwise the text is embedded, a fresh id is
    /// allocated and the record is appended.
    pub async fn insert(&self, text: &str, metadata: Metadata) -> RagResult<Option<Uuid>> {
        if self.records.read().await.texts.contains(text) {
            debug!("Skipping duplicate document");
            return Ok(None);
        }

        let vector = self.embed_checked(text).await?;

        let mut records = self.records.write().await;
        // Another writer may have inserted the same text while we embedded.
        if records.texts.contains(text) {
            debug!("Skipping duplicate document");
            return Ok(None);
        }

        let id = Uuid::new_v4();
        records.texts.insert(text.to_string());
        records.rows.push(DocumentRecord {
            id,
            text: text.to_string(),
            vector,
            metadata,
        });
        debug!(id = %id, total = records.rows.len(), "Inserted document");
        Ok(Some(id))
    }

    /// Insert several documents in order.
    ///
    /// Each entry follows the [`insert`](Self::insert) rule, so a text
    /// repeated inside the batch is stored once. Stops at the first failure;
    /// records inserted before it are kept.
    pub async fn insert_many<I>(&self, documents: I) -> RagResult<Vec<Option<Uuid>>>
    where
        I: IntoIterator<Item = (String, Metadata)>,
    {
        let mut ids = Vec::new();
        for (text, metadata) in documents {
            ids.push(self.insert(&text, metadata).await?);
        }
        let added = ids.iter().filter(|id| id.is_some()).count();
        info!(added, skipped = ids.len() - added, "Batch insert finished");
        Ok(ids)
    }

    /// The `k` records most similar to `text`, best first.
    ///
    /// Ranking uses cosine similarity; equal scores keep insertion order.
    /// An empty store yields an empty result.
    pub async fn query(&self, text: &str, k: usize) -> RagResult<Vec<ScoredDocument>> {
        self.ranked(text, k, None).await
    }

    /// Like [`query`](Self::query), restricted to records whose
    /// `metadata[filter_key]` equals one of `allowed_values`.
    ///
    /// With no allowed values this is exactly [`query`](Self::query).
    pub async fn query_filtered(
        &self,
        text: &str,
        filter_key: &str,
        allowed_values: &[String],
        k: usize,
    ) -> RagResult<Vec<ScoredDocument>> {
        let filter = MetadataFilter::from_values(filter_key, allowed_values.iter().cloned());
        self.ranked(text, k, filter.as_ref()).await
    }

    /// Drop every record. Irreversible.
    pub async fn erase_all(&self) {
        let mut records = self.records.write().await;
        let dropped = records.rows.len();
        *records = Records::default();
        warn!(dropped, "Erased all documents");
    }

    /// Write every record to `path` as a snapshot, replacing the file atomically.
    ///
    /// Returns the number of records written. Writers wait until the snapshot
    /// is on disk.
    pub async fn save(&self, path: &Path) -> RagResult<usize> {
        let records = self.records.read().await;
        let data = snapshot::encode(&records.rows)?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut tmp_name = path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp_path = std::path::PathBuf::from(tmp_name);
        tokio::fs::write(&tmp_path, data.as_bytes()).await?;
        tokio::fs::rename(&tmp_path, path).await?;

        info!(path = %path.display(), count = records.rows.len(), "Saved document snapshot");
        Ok(records.rows.len())
    }

    /// Replace the store's contents with the snapshot at `path`.
    ///
    /// The file is parsed and validated completely before anything changes;
    /// on error the current records are untouched. Returns the number of
    /// records loaded.
    pub async fn load(&self, path: &Path) -> RagResult<usize> {
        let data = tokio::fs::read_to_string(path).await?;
        let rows = snapshot::decode(&data, self.dimension())?;
        let count = rows.len();

        *self.records.write().await = Records::from_rows(rows);
        info!(path = %path.display(), count, "Loaded document snapshot");
        Ok(count)
    }

    async fn embed_checked(&self, text: &str) -> RagResult<Vec<f32>> {
        let vector = self.embedder.embed(text).await?;
        let expected = self.dimension();
        if vector.len() != expected {
            return Err(RagError::DimensionMismatch {
                expected,
                actual: vector.len(),
            });
        }
        if let Some(pos) = vector.iter().position(|x| !x.is_finite()) {
            return Err(RagError::Embedding(format!(
                "embedding element {pos} is not a finite number ({})",
                vector[pos]
            )));
        }
        Ok(vector)
    }

    async fn ranked(
        &self,
        text: &str,
        k: usize,
        filter: Option<&MetadataFilter>,
    ) -> RagResult<Vec<ScoredDocument>> {
        if k == 0 || self.is_empty().await {
            return Ok(Vec::new());
        }

        let query = self.embed_checked(text).await?;
        let records = self.records.read().await;

        let mut scored: Vec<(usize, f32)> = records
            .rows
            .iter()
            .enumerate()
            .filter(|(_, r)| filter.map_or(true, |f| f.matches(&r.metadata)))
            .map(|(idx, r)| (idx, cosine_similarity(&query, &r.vector)))
            .collect();

        // Stable sort: equal similarities stay in insertion order.
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(idx, similarity)| {
                let record = &records.rows[idx];
                ScoredDocument {
                    similarity,
                    distance: euclidean_distance(&query, &record.vector),
                    record: record.clone(),
                }
            })
            .collect())
    }
}

/// Cosine similarity between two vectors, in `[-1, 1]`.
///
/// Zero when the lengths differ or either vector has zero norm.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let na: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let nb: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if na == 0.0 || nb == 0.0 {
        0.0
    } else {
        dot / (na * nb)
    }
}

/// Euclidean (L2) distance between two vectors of equal length.
pub fn euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}
