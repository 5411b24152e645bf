//! Span hooks for `tower_http::trace::TraceLayer`
//!
//! Every routed request gets a server span named `METHOD /path`, parented on
//! any inbound trace context and tagged with the response status.

use axum::http::{Request, Response};
use std::time::Duration;
use tower_http::trace::{MakeSpan, OnResponse};
use tracing::{field, Span};
use tracing_opentelemetry::OpenTelemetrySpanExt;

use super::propagation::extract_context;

#[derive(Clone, Copy, Debug, Default)]
pub struct MakeRequestSpan;

impl<B> MakeSpan<B> for MakeRequestSpan {
    fn make_span(&mut self, request: &Request<B>) -> Span {
        let method = request.method();
        let path = request.uri().path();

        let span = tracing::info_span!(
            "http.request",
            otel.name = %format!("{} {}", method, path),
            otel.kind = "server",
            otel.status_code = field::Empty,
            http.request.method = %method,
            url.path = %path,
            http.response.status_code = field::Empty,
        );
        span.set_parent(extract_context(request.headers()));
        span
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct RecordResponse;

impl<B> OnResponse<B> for RecordResponse {
    fn on_response(self, response: &Response<B>, latency: Duration, span: &Span) {
        let status = response.status();
        span.record("http.response.status_code", status.as_u16());
        if status.is_server_error() {
            span.record("otel.status_code", "ERROR");
        }

        tracing::debug!(
            parent: span,
            status = status.as_u16(),
            latency_ms = latency.as_millis() as u64,
            "Request finished"
        );
    }
}
