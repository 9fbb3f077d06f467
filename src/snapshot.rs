//! Snapshot pass-through.
//!
//! The status and landing-page documents are precomputed by the external
//! ingestion process and served verbatim. An absent, empty or unparseable
//! file degrades to an empty array rather than an error.

use serde_json::Value;
use std::path::Path;

pub const STATUS_FILE: &str = "status.json";
pub const LANDING_FILE: &str = "landingpagedata.json";

/// Reads a snapshot document, falling back to `[]`.
pub async fn read_snapshot(path: &Path) -> Value {
    let data = match tokio::fs::read_to_string(path).await {
        Ok(data) => data,
        Err(e) => {
            tracing::warn!(
                target: "navigator::snapshot",
                path = %path.display(),
                error = %e,
                "snapshot read failed"
            );
            return Value::Array(Vec::new());
        }
    };

    if data.trim().is_empty() {
        return Value::Array(Vec::new());
    }

    serde_json::from_str(&data).unwrap_or_else(|e| {
        tracing::warn!(
            target: "navigator::snapshot",
            path = %path.display(),
            error = %e,
            "snapshot is not valid JSON"
        );
        Value::Array(Vec::new())
    })
}
