use axum::{
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::json;

/// Health check endpoint
/// Returns 200 OK if the service is running
pub async fn health_check() -> impl IntoResponse {
    tracing::info!("Health check");
    (StatusCode::OK, Json(json!({ "status": "ok" })))
}
