#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Regression tests for ragvault-security: TokenIssuer, Credentials,
//! RateLimiter, Sanitizer, TLS config validation.

use std::sync::Arc;
use std::time::Duration;

use ragvault_security::{
    validate_tls_config, Credentials, RateLimiter, SanitizeError, Sanitizer, TlsConfig,
    TokenError, TokenIssuer,
};

// --- TokenIssuer ---

#[test]
fn test_token_lifecycle() {
    let issuer = TokenIssuer::new("s3cr3t", Duration::from_secs(3600)).unwrap();
    let issued_at = 1_700_000_000;
    let token = issuer.issue_at("admin", issued_at).unwrap();

    assert_eq!(issuer.verify_at(&token, issued_at).unwrap().sub, "admin");
    assert_eq!(
        issuer.verify_at(&token, issued_at + 3599).unwrap().sub,
        "admin"
    );
    assert_eq!(
        issuer.verify_at(&token, issued_at + 3600),
        Err(TokenError::Expired)
    );
}

#[test]
fn test_token_error_messages() {
    assert_eq!(TokenError::Expired.to_string(), "Token expired");
    assert_eq!(TokenError::Invalid.to_string(), "Invalid token");
}

#[test]
fn test_token_signed_by_rotated_secret_is_invalid() {
    let old = TokenIssuer::new("old", Duration::from_secs(60)).unwrap();
    let new = TokenIssuer::new("new", Duration::from_secs(60)).unwrap();
    let token = old.issue("admin").unwrap();
    assert_eq!(new.verify(&token), Err(TokenError::Invalid));
}

#[test]
fn test_credentials_check() {
    let creds = Credentials::new("admin", "pw");
    assert!(creds.matches("admin", "pw"));
    assert!(!creds.matches("admin", "pw "));
}

// --- RateLimiter ---

#[tokio::test]
async fn test_rate_limiter_rejects_after_burst() {
    let limiter = RateLimiter::per_minute(50);
    for i in 0..50 {
        assert!(limiter.check("127.0.0.1").await, "request {i} rejected");
    }
    assert!(!limiter.check("127.0.0.1").await);
    assert!(limiter.check("127.0.0.2").await);
}

#[tokio::test]
async fn test_rate_limiter_shared_across_tasks() {
    let limiter = Arc::new(RateLimiter::per_minute(10));
    let mut handles = Vec::new();
    for _ in 0..20 {
        let limiter = limiter.clone();
        handles.push(tokio::spawn(async move { limiter.check("user").await }));
    }
    let mut allowed = 0;
    for handle in handles {
        if handle.await.unwrap() {
            allowed += 1;
        }
    }
    assert_eq!(allowed, 10);
}

// --- Sanitizer ---

#[test]
fn test_sanitizer_limits() {
    let s = Sanitizer::default();
    assert!(s.validate("What is a hammer used for?").is_ok());
    assert_eq!(s.validate(&"x".repeat(2001)), Err(SanitizeError::TooLong));
    assert_eq!(
        s.validate("bell\x07"),
        Err(SanitizeError::ControlCharacters)
    );
}

// --- TLS ---

#[test]
fn test_tls_config_validation() {
    let tmp = tempfile::tempdir().unwrap();
    let cert = tmp.path().join("cert.pem");
    let key = tmp.path().join("key.pem");
    std::fs::write(&cert, "cert").unwrap();
    std::fs::write(&key, "key").unwrap();

    let ok = TlsConfig::from_paths(cert.to_string_lossy(), key.to_string_lossy());
    assert!(validate_tls_config(&ok).is_ok());

    let missing = TlsConfig::from_paths("/nonexistent/cert.pem", key.to_string_lossy());
    assert!(validate_tls_config(&missing).is_err());
}
