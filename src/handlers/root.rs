use axum::response::Json;
use serde_json::{json, Value};

/// Static greeting
pub async fn root() -> Json<Value> {
    Json(json!({ "message": "Hello, OpenTelemetry!" }))
}
