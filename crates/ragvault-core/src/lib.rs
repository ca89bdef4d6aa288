//! Core types shared by every ragvault crate.
//!
//! # Main types
//!
//! - [`RagError`]: Unified error enum for the retrieval engine, completion client and gateway plumbing.
//! - [`RagResult`]: Convenience alias for `Result<T, RagError>`.

/// Error types.
pub mod error;

pub use error::{RagError, RagResult};
