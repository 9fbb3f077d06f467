//! Shared test fixtures.

use crate::store::{ExplorerDb, StoreConfig};

/// In-memory store with the reference schema applied. A single pooled
/// connection keeps all statements on the same memory database.
pub(crate) async fn memory_db() -> ExplorerDb {
    let db = ExplorerDb::connect(StoreConfig {
        url: "sqlite::memory:".to_string(),
        max_connections: 1,
    })
    .await
    .expect("in-memory store");
    db.init_schema().await.expect("reference schema");
    db
}
