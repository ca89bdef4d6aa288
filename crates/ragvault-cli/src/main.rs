use axum::extract::ConnectInfo;
use axum::Extension;
use clap::{Parser, Subcommand};
use ragvault_cli::app::{build_state, build_store};
use ragvault_cli::RagvaultConfig;
use ragvault_gateway::GatewayServer;
use ragvault_memory::RetrievalService;
use ragvault_security::tls;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ragvault", about = "Authenticated RAG document store and LLM gateway")]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "ragvault.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the API server
    Serve {
        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,
        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Add documents from a JSON file of `[text, {metadata}]` pairs and save the snapshot
    Ingest {
        /// JSON file to read
        file: PathBuf,
    },
    /// Search the saved snapshot
    Query {
        /// Query text
        text: String,
        /// Number of results
        #[arg(short, default_value_t = 10)]
        k: usize,
        /// Metadata key to filter on
        #[arg(long, requires = "values")]
        filter_key: Option<String>,
        /// Allowed values for the filter key (repeatable)
        #[arg(long = "value")]
        values: Vec<String>,
    },
}

/// One entry of an ingest file: `["text", {...}]` or `["text"]`.
#[derive(Deserialize)]
#[serde(untagged)]
enum IngestItem {
    WithMetadata(String, Map<String, Value>),
    Bare((String,)),
}

impl IngestItem {
    fn into_pair(self) -> (String, Map<String, Value>) {
        match self {
            IngestItem::WithMetadata(text, metadata) => (text, metadata),
            IngestItem::Bare((text,)) => (text, Map::new()),
        }
    }
}

const LIMITER_CLEANUP_EVERY: Duration = Duration::from_secs(300);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    if let Ok(path) = dotenvy::dotenv() {
        info!(path = %path.display(), "Loaded environment file");
    }

    let cli = Cli::parse();

    let mut config = RagvaultConfig::load(&cli.config).await?;
    config.apply_process_env();

    match cli.command {
        Commands::Serve { host, port } => serve(config, host, port).await?,
        Commands::Ingest { file } => ingest(config, file).await?,
        Commands::Query {
            text,
            k,
            filter_key,
            values,
        } => query(config, text, k, filter_key, values).await?,
    }

    Ok(())
}

async fn serve(config: RagvaultConfig, host: Option<String>, port: Option<u16>) -> anyhow::Result<()> {
    config.validate_for_serve()?;

    let host = host.unwrap_or_else(|| config.server.host.clone());
    let port = port.unwrap_or(config.server.port);

    let store = build_store(&config).await?;
    let state = build_state(&config, store)?;
    let _cleanup = GatewayServer::spawn_limiter_cleanup(state.clone(), LIMITER_CLEANUP_EVERY);
    let app = GatewayServer::build(state.clone());

    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    if config.server.tls.enabled {
        let acceptor = tls::build_tls_acceptor(&config.server.tls).await?;

        info!(addr = %addr, "ragvault listening (TLS enabled)");
        loop {
            let (stream, peer_addr) = tokio::select! {
                accepted = listener.accept() => accepted?,
                _ = tokio::signal::ctrl_c() => break,
            };
            let acceptor = acceptor.clone();
            let app = app.clone().layer(Extension(ConnectInfo(peer_addr)));
            tokio::spawn(async move {
                match acceptor.accept(stream).await {
                    Ok(tls_stream) => {
                        let io = hyper_util::rt::TokioIo::new(tls_stream);
                        let svc = hyper_util::service::TowerToHyperService::new(app);
                        let conn = hyper_util::server::conn::auto::Builder::new(
                            hyper_util::rt::TokioExecutor::new(),
                        );
                        if let Err(e) = conn.serve_connection(io, svc).await {
                            error!(peer = %peer_addr, error = %e, "TLS connection error");
                        }
                    }
                    Err(e) => {
                        warn!(peer = %peer_addr, error = %e, "TLS handshake failed");
                    }
                }
            });
        }
    } else {
        warn!(addr = %addr, "ragvault listening without TLS");
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;
    }

    info!("Shutting down");
    persist(&state.retrieval, &config).await;
    Ok(())
}

async fn persist(retrieval: &RetrievalService, config: &RagvaultConfig) {
    match retrieval.save(&config.memory.snapshot_path).await {
        Ok(count) => info!(count, path = %config.memory.snapshot_path.display(), "Snapshot saved"),
        Err(e) => error!(error = %e, "Snapshot could not be saved"),
    }
}

async fn ingest(config: RagvaultConfig, file: PathBuf) -> anyhow::Result<()> {
    let text = tokio::fs::read_to_string(&file)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to read '{}': {e}", file.display()))?;
    let items: Vec<IngestItem> = serde_json::from_str(&text).map_err(|e| {
        anyhow::anyhow!(
            "'{}' must be a JSON array of [text, {{metadata}}] pairs: {e}",
            file.display()
        )
    })?;

    let store = build_store(&config).await?;
    let retrieval = RetrievalService::new(store);
    let ids = retrieval
        .add_documents(items.into_iter().map(IngestItem::into_pair).collect())
        .await?;
    let added = ids.iter().filter(|id| id.is_some()).count();
    let saved = retrieval.save(&config.memory.snapshot_path).await?;

    println!(
        "added {added}, skipped {} duplicate(s); {saved} document(s) in {}",
        ids.len() - added,
        config.memory.snapshot_path.display()
    );
    Ok(())
}

async fn query(
    config: RagvaultConfig,
    text: String,
    k: usize,
    filter_key: Option<String>,
    values: Vec<String>,
) -> anyhow::Result<()> {
    let retrieval = RetrievalService::new(build_store(&config).await?);
    let hits = match filter_key {
        Some(key) => retrieval.search_filtered(&text, &key, &values, k).await?,
        None => retrieval.search(&text, k).await?,
    };
    println!("{}", serde_json::to_string_pretty(&hits)?);
    Ok(())
}
