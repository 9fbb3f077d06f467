//! Configuration for the Navigator API server

use clap::Parser;

/// Navigator explorer API
///
/// Serves entity resolution and batch aggregation over an externally
/// ingested ledger store.
#[derive(Parser, Debug)]
#[command(name = "navigator-api")]
#[command(about = "Serve the Navigator explorer API", long_about = None)]
pub struct Config {
    /// Host to bind to
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(long, default_value = "3500")]
    pub port: u16,

    /// Store URL (postgres://...) or SQLite file path
    #[arg(
        long,
        env = "NAVIGATOR_DATABASE_URL",
        default_value = "./navigator.db"
    )]
    pub database_url: String,

    /// Connection pool size
    #[arg(long, default_value = "5")]
    pub pool_size: u32,

    /// Directory holding the ingester's snapshot documents
    /// (status.json, landingpagedata.json)
    #[arg(long, default_value = ".")]
    pub snapshot_dir: String,

    /// Create the reference tables on startup if they do not exist
    ///
    /// Production stores are built by the ingestion process; this is for
    /// bringing up a local instance against an empty database.
    #[arg(long)]
    pub init_schema: bool,
}
