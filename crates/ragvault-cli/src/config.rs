//! `ragvault.toml` loading with environment overrides.

use ragvault_agent::ModelConfig;
use ragvault_core::{RagError, RagResult};
use ragvault_security::{validate_tls_config, TlsConfig};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variables that override the file.
pub mod env {
    /// Token signing secret.
    pub const SECRET_KEY: &str = "SECRET_KEY";
    /// Login username.
    pub const USERNAME: &str = "USERNAME1";
    /// Login password.
    pub const PASSWORD: &str = "PASSWORD";
    /// PEM certificate; together with the key path this enables TLS.
    pub const SSL_CERTIFICATE_PATH: &str = "SSL_CERTIFICATE_PATH";
    /// PEM private key.
    pub const SSL_KEY_PATH: &str = "SSL_KEY_PATH";
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RagvaultConfig {
    /// Listener settings.
    pub server: ServerConfig,
    /// Auth, limits and input policy.
    pub security: SecurityConfig,
    /// Completion backend.
    pub model: ModelConfig,
    /// Embeddings and persistence.
    pub memory: MemoryConfig,
}

/// `[server]`
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// `[server.tls]`
    pub tls: TlsConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            tls: TlsConfig::default(),
        }
    }
}

/// `[security]`
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// HMAC secret for bearer tokens. Required by `serve`.
    pub secret_key: String,
    /// Token lifetime.
    pub token_ttl_secs: u64,
    /// Login username.
    pub username: String,
    /// Login password.
    pub password: String,
    /// Login attempts per client address per minute.
    pub login_per_minute: u32,
    /// Authenticated requests per user per minute.
    pub api_per_minute: u32,
    /// Ceiling on user-supplied text, in characters.
    pub max_input_chars: usize,
    /// Enables `POST /api/admin/erase`.
    pub allow_erase: bool,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            secret_key: String::new(),
            token_ttl_secs: 3600,
            username: String::new(),
            password: String::new(),
            login_per_minute: 50,
            api_per_minute: 30,
            max_input_chars: 2000,
            allow_erase: false,
        }
    }
}

impl std::fmt::Debug for SecurityConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecurityConfig")
            .field("secret_key", &"<redacted>")
            .field("token_ttl_secs", &self.token_ttl_secs)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("login_per_minute", &self.login_per_minute)
            .field("api_per_minute", &self.api_per_minute)
            .field("max_input_chars", &self.max_input_chars)
            .field("allow_erase", &self.allow_erase)
            .finish()
    }
}

/// `[memory]`
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    /// Snapshot loaded at startup and written by save.
    pub snapshot_path: PathBuf,
    /// `[memory.embedding]`
    pub embedding: EmbeddingConfig,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            snapshot_path: PathBuf::from("./data/documents.jsonl"),
            embedding: EmbeddingConfig::default(),
        }
    }
}

/// Which embedder to build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProviderKind {
    /// In-process feature hashing.
    #[default]
    Local,
    /// OpenAI-compatible `/v1/embeddings` server.
    Http,
}

/// `[memory.embedding]`
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Embedder kind.
    pub provider: EmbeddingProviderKind,
    /// Vector length. Must match any existing snapshot.
    pub dimension: usize,
    /// Embedding server root (http provider only).
    pub base_url: String,
    /// Embedding model name (http provider only).
    pub model: String,
    /// Bearer key (http provider only).
    pub api_key: String,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingProviderKind::Local,
            dimension: ragvault_memory::embedding::DEFAULT_DIMENSION,
            base_url: "http://127.0.0.1:8080".to_string(),
            model: "local-embedding".to_string(),
            api_key: String::new(),
        }
    }
}

impl RagvaultConfig {
    /// Parse TOML text.
    pub fn from_toml_str(text: &str) -> RagResult<Self> {
        toml::from_str(text).map_err(|e| RagError::Config(format!("invalid config: {e}")))
    }

    /// Read `path`, or fall back to defaults when it does not exist.
    pub async fn load(path: &Path) -> RagResult<Self> {
        match tokio::fs::read_to_string(path).await {
            Ok(text) => {
                info!(path = %path.display(), "Loaded config file");
                Self::from_toml_str(&text)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(path = %path.display(), "Config file not found, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(RagError::Config(format!(
                "Failed to read config file '{}': {e}",
                path.display()
            ))),
        }
    }

    /// Apply overrides from the process environment.
    pub fn apply_process_env(&mut self) {
        self.apply_env(|key| std::env::var(key).ok());
    }

    /// Apply overrides from `lookup`. Empty values are ignored.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(secret) = get(env::SECRET_KEY) {
            self.security.secret_key = secret;
        }
        if let Some(username) = get(env::USERNAME) {
            self.security.username = username;
        }
        if let Some(password) = get(env::PASSWORD) {
            self.security.password = password;
        }
        if let (Some(cert), Some(key)) = (get(env::SSL_CERTIFICATE_PATH), get(env::SSL_KEY_PATH)) {
            self.server.tls = TlsConfig::from_paths(cert, key);
        }
    }

    /// Checks that only matter when running the server.
    pub fn validate_for_serve(&self) -> RagResult<()> {
        if self.security.secret_key.is_empty() {
            return Err(RagError::Config(format!(
                "no token secret configured: set security.secret_key or {}",
                env::SECRET_KEY
            )));
        }
        if self.security.username.is_empty() || self.security.password.is_empty() {
            warn!("Login credentials are not configured; /api/login will reject every attempt");
        }
        if self.memory.embedding.dimension == 0 {
            return Err(RagError::Config(
                "memory.embedding.dimension must be at least 1".to_string(),
            ));
        }
        validate_tls_config(&self.server.tls)
    }
}
