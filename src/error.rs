//! Error taxonomy for the resolution and aggregation engine.
//!
//! `NotFound` is deliberately absent: a well-formed identifier that matches
//! nothing is legitimate empty output, served with HTTP 200.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// The identifier contains characters outside the accepted set.
    /// Detected before any query is issued.
    #[error("identifier failed validation")]
    ValidationRejected,

    /// The batch body could not be turned into any usable entries.
    #[error("malformed batch input: {0}")]
    MalformedBatchInput(&'static str),

    /// The backing store failed mid-cascade. The remainder of the cascade
    /// is abandoned and the fault is surfaced to the caller instead of
    /// stalling the response.
    #[error("store fault: {0}")]
    StoreFault(#[from] sqlx::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::ValidationRejected => (StatusCode::BAD_REQUEST, "invalid identifier"),
            ApiError::MalformedBatchInput(reason) => (StatusCode::BAD_REQUEST, *reason),
            ApiError::StoreFault(e) => {
                tracing::error!(target: "navigator::http", error = %e, "store fault");
                (StatusCode::BAD_GATEWAY, "store fault")
            }
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_rejection_maps_to_bad_request() {
        let response = ApiError::ValidationRejected.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn store_fault_maps_to_bad_gateway() {
        let response = ApiError::StoreFault(sqlx::Error::PoolClosed).into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
