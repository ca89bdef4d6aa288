//! Retrieval engine: embeddings, a brute-force document store and the
//! boundary service the HTTP gateway talks to.
//!
//! # Main types
//!
//! - [`EmbeddingProvider`]: Trait for turning text into fixed-length vectors.
//! - [`LocalEmbedding`]: Deterministic feature-hashing embedder, no external service.
//! - [`DocumentStore`]: Records with text, vector and metadata; similarity and filtered queries; snapshots.
//! - [`MetadataFilter`]: Equality / any-of predicate over one metadata key.
//! - [`Metadata`]: String-to-string metadata with the documented coercion step.
//! - [`RetrievalService`]: Boundary wrapper that relabels failures for the gateway.

/// Embedding provider trait and local implementation.
pub mod embedding;
/// Metadata filtering predicates.
pub mod filter;
/// OpenAI-compatible HTTP embedding provider.
#[cfg(feature = "http-embeddings")]
pub mod http_embedding;
/// String-coerced document metadata.
pub mod metadata;
/// Boundary service exposed to the gateway.
pub mod retrieval;
/// Snapshot (JSON Lines) encoding and decoding.
pub mod snapshot;
/// Document store.
pub mod store;

pub use embedding::{EmbeddingProvider, LocalEmbedding};
pub use filter::MetadataFilter;
#[cfg(feature = "http-embeddings")]
pub use http_embedding::HttpEmbedding;
pub use metadata::Metadata;
pub use retrieval::{RetrievalError, RetrievalService, SearchHit};
pub use store::{cosine_similarity, euclidean_distance, DocumentRecord, DocumentStore, ScoredDocument};
