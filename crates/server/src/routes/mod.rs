//! API route handlers
//!
//! - `ask`: the question endpoint
//! - `health`: liveness, readiness and metrics

pub mod ask;
pub mod health;

use crate::error::ApiError;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

/// Service name and the endpoints it exposes.
pub async fn api_info() -> impl IntoResponse {
    Json(json!({
        "name": "What Would Taylor Say",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": [
            "POST /api/ask",
            "GET /health",
            "GET /ready",
            "GET /metrics"
        ]
    }))
}

/// 404 Not Found handler
pub async fn not_found() -> ApiError {
    ApiError::NotFound
}

/// 405 for any method other than the one a route accepts.
pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}
