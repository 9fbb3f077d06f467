//! Navigator API - blockchain explorer REST server
//!
//! Read-only reporting layer over a ledger store populated by an external
//! ingestion process.
//!
//! # Usage
//!
//! ```bash
//! # Serve an ingested SQLite store
//! navigator-api --database-url ./navigator.db
//!
//! # Serve a postgres store with a larger pool
//! navigator-api --database-url postgres://navigator@localhost/explorer --pool-size 16
//!
//! # Local bring-up against an empty database
//! navigator-api --init-schema
//! ```

mod config;

use anyhow::Result;
use clap::Parser;
use config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let config = Config::parse();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(true)
        .init();

    tracing::info!("Starting Navigator API server");
    tracing::info!("Database: {}", config.database_url);
    tracing::info!("Snapshot directory: {}", config.snapshot_dir);
    tracing::info!("Pool size: {}", config.pool_size);

    let server_config = navigator::Config::builder()
        .host(config.host)
        .port(config.port)
        .database_url(config.database_url)
        .pool_size(config.pool_size)
        .snapshot_dir(config.snapshot_dir)
        .init_schema(config.init_schema)
        .build();

    navigator::run(server_config).await
}
