//! Navigator - ledger-backed blockchain explorer API.
//!
//! Resolves opaque hash identifiers into composite entity records by
//! chaining dependent lookups against an externally ingested relational
//! store, and aggregates batches of addresses or host contracts. Strictly
//! read-only: the ingester owns all writes.

pub mod batch;
pub mod error;
pub mod http;
pub mod ledger;
pub mod model;
pub mod resolve;
pub mod snapshot;
pub mod store;

#[cfg(test)]
pub(crate) mod testutil;

pub use error::ApiError;
pub use store::{ExplorerDb, StoreConfig};

use axum::Router as AxumRouter;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{Any as CorsAny, CorsLayer};

/// Configuration for the Navigator server.
pub struct Config {
    /// Host to bind to.
    pub host: String,

    /// Port to listen on.
    pub port: u16,

    /// Store URL (postgres://...) or SQLite file path.
    pub database_url: String,

    /// Connection pool size. Concurrent requests share the pool; each
    /// request's cascade borrows a connection per query.
    pub pool_size: u32,

    /// Directory holding the ingester's snapshot documents
    /// (`status.json`, `landingpagedata.json`).
    pub snapshot_dir: PathBuf,

    /// Create the reference tables on startup if they do not exist.
    /// Useful for local bring-up against an empty database.
    pub init_schema: bool,
}

impl Config {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Builder for [`Config`].
#[derive(Default)]
pub struct ConfigBuilder {
    host: Option<String>,
    port: Option<u16>,
    database_url: Option<String>,
    pool_size: Option<u32>,
    snapshot_dir: Option<PathBuf>,
    init_schema: bool,
}

impl ConfigBuilder {
    pub fn host(mut self, host: String) -> Self {
        self.host = Some(host);
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn database_url(mut self, url: String) -> Self {
        self.database_url = Some(url);
        self
    }

    pub fn pool_size(mut self, size: u32) -> Self {
        self.pool_size = Some(size);
        self
    }

    pub fn snapshot_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.snapshot_dir = Some(dir.into());
        self
    }

    pub fn init_schema(mut self, init: bool) -> Self {
        self.init_schema = init;
        self
    }

    pub fn build(self) -> Config {
        Config {
            host: self.host.unwrap_or_else(|| "0.0.0.0".to_string()),
            port: self.port.unwrap_or(3500),
            database_url: self
                .database_url
                .unwrap_or_else(|| "sqlite://navigator.db".to_string()),
            pool_size: self.pool_size.unwrap_or(5),
            snapshot_dir: self.snapshot_dir.unwrap_or_else(|| PathBuf::from(".")),
            init_schema: self.init_schema,
        }
    }
}

/// Starts the Navigator server and runs until a shutdown signal arrives.
///
/// NOTE: The caller is responsible for initializing the tracing subscriber
/// before calling this function.
pub async fn run(config: Config) -> anyhow::Result<()> {
    let db = ExplorerDb::connect(StoreConfig {
        url: config.database_url.clone(),
        max_connections: config.pool_size,
    })
    .await?;

    if config.init_schema {
        db.init_schema().await?;
        tracing::info!(target: "navigator::main", "Reference schema initialized");
    }

    let state = Arc::new(http::AppState::new(db, config.snapshot_dir.clone()));

    let cors = CorsLayer::new()
        .allow_origin(CorsAny)
        .allow_methods(CorsAny)
        .allow_headers(CorsAny);

    let app: AxumRouter = http::create_router(state).layer(cors);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(target: "navigator::main", "Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!(target: "navigator::main", "Navigator shutdown complete");

    Ok(())
}

/// Resolves when SIGINT or SIGTERM arrives.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!(target: "navigator::main", "Received SIGINT (Ctrl+C), shutting down...");
        }
        _ = terminate => {
            tracing::info!(target: "navigator::main", "Received SIGTERM, shutting down...");
        }
    }
}
