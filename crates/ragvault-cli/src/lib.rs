//! Library side of the `ragvault` binary: configuration and service wiring.

/// Service construction from configuration.
pub mod app;
/// Configuration file and environment overrides.
pub mod config;

pub use config::RagvaultConfig;
