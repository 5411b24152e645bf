//! Requests must behave the same whether or not the OTLP collector is reachable.
//!
//! This binary installs the global subscriber, so it holds a single test.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use otel_demo::{
    config::{Config, DatabaseConfig, OutboundConfig, TelemetryConfig},
    handlers::AppState,
    server::{create_router, prepare_database},
    telemetry::{self, TelemetryError},
    upstream::OutboundClient,
};
use serde_json::{json, Value};
use tower::ServiceExt;

async fn get(app: Router, uri: &str, traceparent: Option<&str>) -> (StatusCode, Value) {
    let mut builder = Request::builder().uri(uri);
    if let Some(value) = traceparent {
        builder = builder.header("traceparent", value);
    }
    let response = app
        .oneshot(builder.body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

// The tonic exporter needs a multi-threaded runtime to build its channel
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_requests_unaffected_by_unreachable_collector() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config {
        database: DatabaseConfig {
            url: format!("sqlite://{}", dir.path().join("export.db").display()),
            ..DatabaseConfig::default()
        },
        outbound: OutboundConfig {
            enabled: false,
            ..OutboundConfig::default()
        },
        telemetry: TelemetryConfig {
            otlp_endpoint: "http://127.0.0.1:1".to_string(),
            ..TelemetryConfig::default()
        },
        ..Config::default()
    };

    let guard = telemetry::init(&config.telemetry, &config.server).unwrap();
    assert!(guard.is_exporting());
    assert!(telemetry::is_initialized());
    assert!(matches!(
        telemetry::init(&config.telemetry, &config.server),
        Err(TelemetryError::AlreadyInitialized)
    ));

    let db = prepare_database(&config).await.unwrap();
    let app = create_router(AppState {
        db,
        outbound: OutboundClient::from_config(&config.outbound),
        simulate_errors: false,
    });

    let (status, body) = get(app.clone(), "/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "message": "Hello, OpenTelemetry!" }));

    let (status, body) = get(app.clone(), "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok" }));

    // A remote parent is accepted and does not change the response
    let (status, body) = get(
        app,
        "/users",
        Some("00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 5);

    // Skip guard.shutdown(): flushing towards a dead endpoint only adds
    // exporter timeouts to the test run
    drop(guard);
}
