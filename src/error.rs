use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::any::Any;

/// Body returned for every failed request; internal detail stays in the logs
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// Application error types
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Query or connection failure against the store
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    /// Deliberate failure raised by the error-simulation mode
    #[error("Simulated failure: {0}")]
    Simulated(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        tracing::error!(
            error = %self,
            error_type = error_type_name(&self),
            "Unhandled error while serving request"
        );
        internal_error_response()
    }
}

fn error_type_name(error: &AppError) -> &'static str {
    match error {
        AppError::Database(_) => "database_error",
        AppError::Simulated(_) => "simulated_error",
    }
}

/// Generic 500 response shared by the error and panic handlers
pub fn internal_error_response() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "message": INTERNAL_ERROR_MESSAGE })),
    )
        .into_response()
}

/// Panic hook for `CatchPanicLayer`
#[tracing::instrument(skip_all, name = "middleware.catch_panic")]
pub fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        (*s).to_string()
    } else {
        "<unknown>".to_string()
    };

    tracing::error!(panic = %detail, "Route handler panicked");
    internal_error_response()
}
