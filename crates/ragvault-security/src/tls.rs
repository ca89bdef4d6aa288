use ragvault_core::{RagError, RagResult};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use tokio_rustls::rustls::{
    pki_types::{CertificateDer, PrivateKeyDer},
    ServerConfig,
};
use tokio_rustls::TlsAcceptor;
use tracing::info;

/// TLS termination settings for the gateway listener.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TlsConfig {
    /// Serve HTTPS instead of plain HTTP.
    pub enabled: bool,
    /// PEM certificate chain.
    pub cert_path: String,
    /// PEM private key (PKCS#8, RSA or SEC1).
    pub key_path: String,
}

impl TlsConfig {
    /// TLS enabled with the given PEM files.
    pub fn from_paths(cert_path: impl Into<String>, key_path: impl Into<String>) -> Self {
        Self {
            enabled: true,
            cert_path: cert_path.into(),
            key_path: key_path.into(),
        }
    }
}

/// Build a TLS acceptor from the given config.
pub async fn build_tls_acceptor(config: &TlsConfig) -> RagResult<TlsAcceptor> {
    if !config.enabled {
        return Err(RagError::Config("TLS is not enabled".to_string()));
    }

    let certs = load_certs(&config.cert_path).await?;
    let key = load_private_key(&config.key_path).await?;

    let mut server_config = ServerConfig::builder()
        .with_no_client_auth()
        .with_single_cert(certs, key)
        .map_err(|e| RagError::Config(format!("TLS config error: {e}")))?;
    server_config.alpn_protocols = vec![b"h2".to_vec(), b"http/1.1".to_vec()];

    info!(cert = %config.cert_path, "TLS enabled");
    Ok(TlsAcceptor::from(Arc::new(server_config)))
}

async fn load_certs(path: &str) -> RagResult<Vec<CertificateDer<'static>>> {
    let data = tokio::fs::read(path)
        .await
        .map_err(|e| RagError::Config(format!("Failed to read cert '{path}': {e}")))?;

    let mut reader = std::io::BufReader::new(data.as_slice());
    let certs: Vec<CertificateDer<'static>> = rustls_pemfile::certs(&mut reader)
        .filter_map(|r| r.ok())
        .collect();

    if certs.is_empty() {
        return Err(RagError::Config(format!(
            "No certificates found in '{path}'"
        )));
    }

    Ok(certs)
}

async fn load_private_key(path: &str) -> RagResult<PrivateKeyDer<'static>> {
    let data = tokio::fs::read(path)
        .await
        .map_err(|e| RagError::Config(format!("Failed to read key '{path}': {e}")))?;

    let mut reader = std::io::BufReader::new(data.as_slice());
    rustls_pemfile::private_key(&mut reader)
        .map_err(|e| RagError::Config(format!("Failed to parse private key: {e}")))?
        .ok_or_else(|| RagError::Config(format!("No private key found in '{path}'")))
}

/// Check that an enabled config points at existing files.
pub fn validate_tls_config(config: &TlsConfig) -> RagResult<()> {
    if !config.enabled {
        return Ok(());
    }

    if config.cert_path.is_empty() {
        return Err(RagError::Config(
            "TLS enabled but cert_path is empty".to_string(),
        ));
    }
    if config.key_path.is_empty() {
        return Err(RagError::Config(
            "TLS enabled but key_path is empty".to_string(),
        ));
    }

    if !Path::new(&config.cert_path).exists() {
        return Err(RagError::Config(format!(
            "TLS cert not found: {}",
            config.cert_path
        )));
    }
    if !Path::new(&config.key_path).exists() {
        return Err(RagError::Config(format!(
            "TLS key not found: {}",
            config.key_path
        )));
    }

    Ok(())
}
