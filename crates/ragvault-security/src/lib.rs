//! Security primitives for the ragvault gateway.
//!
//! # Main types
//!
//! - [`TokenIssuer`]: Issues and verifies HS256-signed bearer tokens.
//! - [`Credentials`]: The configured login account.
//! - [`RateLimiter`]: Token-bucket rate limiter keyed by client or user.
//! - [`Sanitizer`]: Input length and character validation.
//! - [`TlsConfig`]: TLS termination settings.

/// Token-bucket rate limiting.
pub mod rate_limit;
/// Input validation utilities.
pub mod sanitizer;
/// TLS configuration.
pub mod tls;
/// Bearer token issuance and verification.
pub mod token;

pub use rate_limit::RateLimiter;
pub use sanitizer::{SanitizeError, Sanitizer};
pub use tls::{build_tls_acceptor, validate_tls_config, TlsConfig};
pub use token::{Claims, Credentials, TokenError, TokenIssuer};
