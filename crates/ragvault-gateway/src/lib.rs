//! HTTP API for ragvault.
//!
//! An axum router exposing login, completion, document ingestion and
//! similarity search. Every `/api` route except login requires a bearer
//! token issued by `/api/login`.

/// API error type and its HTTP mapping.
pub mod error;
/// Route handlers.
pub mod handlers;
/// Auth and rate limiting middleware.
pub mod middleware;
/// Response bodies.
pub mod models;
/// Router construction and shared state.
pub mod server;
/// Request-shape validation.
pub mod validate;

pub use error::ApiError;
pub use server::{AppState, GatewayServer};
