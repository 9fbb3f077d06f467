//! HTTP surface.
//!
//! Thin axum layer over the resolution and aggregation engine: routes
//! under `/navigator-api` mirror the deployed API, plus a `/health`
//! endpoint. Handlers validate and delegate; every error becomes an
//! explicit JSON response (the engine never leaves a caller hanging).

use axum::extract::{Path as UrlPath, State};
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;

use crate::batch::addresses::aggregate_addresses;
use crate::batch::contracts::{parse_contract_file, reconcile_contracts};
use crate::error::ApiError;
use crate::model::{BatchRequest, CompositeRecord};
use crate::resolve::resolve_identifier;
use crate::snapshot;
use crate::store::ExplorerDb;

/// Shared state of the HTTP layer.
pub struct AppState {
    pub db: ExplorerDb,
    pub snapshot_dir: PathBuf,
    pub version: String,
    pub startup_time: i64,
}

impl AppState {
    pub fn new(db: ExplorerDb, snapshot_dir: PathBuf) -> Self {
        Self {
            db,
            snapshot_dir,
            version: env!("CARGO_PKG_VERSION").to_string(),
            startup_time: chrono::Utc::now().timestamp(),
        }
    }
}

/// Builds the full router.
pub fn create_router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/", get(welcome_handler))
        .route("/hash/:hash_id", get(hash_handler))
        .route("/addresses", post(addresses_handler))
        .route("/host-contracts", post(host_contracts_handler))
        .route("/status", get(status_handler))
        .route("/landing", get(landing_handler));

    Router::new()
        .nest("/navigator-api", api)
        .route("/health", get(health_handler))
        .with_state(state)
}

async fn welcome_handler() -> Json<Value> {
    Json(serde_json::json!({
        "message": "Welcome to the Navigator explorer API"
    }))
}

/// Single-entity lookup: classify the identifier and run its cascade.
async fn hash_handler(
    State(state): State<Arc<AppState>>,
    UrlPath(hash_id): UrlPath<String>,
) -> Result<Json<CompositeRecord>, ApiError> {
    let record = resolve_identifier(&state.db, &hash_id).await?;
    Ok(Json(record))
}

/// Batch address aggregation.
async fn addresses_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<BatchRequest>,
) -> Result<Json<CompositeRecord>, ApiError> {
    let page = request.page.as_ref().and_then(|p| p.as_i64());
    let record = aggregate_addresses(&state.db, &request.query, page).await?;
    Ok(Json(record))
}

/// Batch contract reconciliation.
async fn host_contracts_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<BatchRequest>,
) -> Result<Json<CompositeRecord>, ApiError> {
    let entries = parse_contract_file(&request.query);
    let record = reconcile_contracts(&state.db, entries).await?;
    Ok(Json(record))
}

/// Current chain/ingestion status, precomputed by the ingester.
async fn status_handler(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(snapshot::read_snapshot(&state.snapshot_dir.join(snapshot::STATUS_FILE)).await)
}

/// Landing-page statistics, precomputed by the ingester.
async fn landing_handler(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(snapshot::read_snapshot(&state.snapshot_dir.join(snapshot::LANDING_FILE)).await)
}

/// Health check response.
#[derive(Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: i64,
}

/// Health check endpoint.
async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let now = chrono::Utc::now().timestamp();
    let uptime = now - state.startup_time;

    Json(HealthResponse {
        status: "healthy".to_string(),
        version: state.version.clone(),
        uptime_seconds: uptime,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::memory_db;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    async fn test_router() -> (Router, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let db = memory_db().await;
        db.execute_raw("INSERT INTO HashTypes VALUES ('aaaa', 'address', 'aaaa')")
            .await
            .unwrap();
        db.execute_raw("INSERT INTO AddressChanges VALUES ('aaaa', 'm1', 7, 0, 10, 6000, 'ScTx')")
            .await
            .unwrap();

        let state = Arc::new(AppState::new(db, dir.path().to_path_buf()));
        (create_router(state), dir)
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_endpoint_reports_healthy() {
        let (app, _dir) = test_router().await;

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let health: HealthResponse = serde_json::from_value(body_json(response).await).unwrap();
        assert_eq!(health.status, "healthy");
        assert!(health.uptime_seconds >= 0);
    }

    #[tokio::test]
    async fn hash_lookup_returns_the_composite_record() {
        let (app, _dir) = test_router().await;

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/navigator-api/hash/aaaa")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let value = body_json(response).await;
        assert_eq!(value[0]["Type"], "address");
        assert_eq!(value[1]["balanceSc"], 7);
    }

    #[tokio::test]
    async fn invalid_hash_is_rejected_with_bad_request() {
        let (app, _dir) = test_router().await;

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/navigator-api/hash/dead..beef")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "invalid identifier");
    }

    #[tokio::test]
    async fn unknown_hash_is_an_empty_array_not_an_error() {
        let (app, _dir) = test_router().await;

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/navigator-api/hash/bbbb")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, serde_json::json!([]));
    }

    #[tokio::test]
    async fn address_batch_accepts_a_numeric_string_page() {
        let (app, _dir) = test_router().await;

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/navigator-api/addresses")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"query": "aaaa", "page": "1"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let value = body_json(response).await;
        assert_eq!(value[0]["balanceSc"], 7);
        assert_eq!(value[0]["page"], 1);
        assert_eq!(value[1]["addresses"][0]["address"], "aaaa");
    }

    #[tokio::test]
    async fn empty_address_batch_is_bad_request() {
        let (app, _dir) = test_router().await;

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/navigator-api/addresses")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"query": "\n\n"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unparseable_contract_file_is_bad_request() {
        let (app, _dir) = test_router().await;

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/navigator-api/host-contracts")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"query": "header only"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn missing_snapshots_serve_empty_arrays() {
        let (app, _dir) = test_router().await;

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/navigator-api/status")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, serde_json::json!([]));
    }
}
