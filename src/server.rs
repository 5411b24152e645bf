use anyhow::{Context, Result};
use axum::{routing::get, Router};
use std::net::SocketAddr;
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};
use tracing::info;

use crate::{
    config::Config,
    db::{self, Database},
    error, handlers,
    handlers::AppState,
    signals::setup_signal_handlers,
    telemetry::http::{MakeRequestSpan, RecordResponse},
    upstream::OutboundClient,
};

/// Start the HTTP server
///
/// This function:
/// 1. Opens the database, creates the schema and reseeds the user table
/// 2. Sets up signal handlers for graceful shutdown
/// 3. Creates the Axum application
/// 4. Binds to the configured address
/// 5. Serves requests until a shutdown signal arrives
///
/// Telemetry must already be initialized by the caller.
pub async fn start_server(config: Config) -> Result<()> {
    let db = prepare_database(&config).await?;

    let state = AppState {
        db: db.clone(),
        outbound: OutboundClient::from_config(&config.outbound),
        simulate_errors: config.server.simulate_errors,
    };

    if state.simulate_errors {
        tracing::warn!("Error simulation enabled: GET /users will always return 500");
    }

    let app = create_router(state);

    let addr = SocketAddr::from((
        config.server.host.parse::<std::net::IpAddr>()?,
        config.server.port,
    ));

    // Setup signal handlers (SIGTERM, SIGINT for shutdown)
    let (shutdown_tx, signal_handle) = setup_signal_handlers();
    let mut shutdown_rx = shutdown_tx.subscribe();

    info!("Starting server on {}", addr);
    info!(
        "Configuration: database {}, outbound calls {}, telemetry export {}",
        config.database.url,
        if config.outbound.enabled { "enabled" } else { "disabled" },
        if config.telemetry.enabled { "enabled" } else { "disabled" },
    );

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    // Serve with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.recv().await;
            info!("Shutdown signal received, draining connections...");
        })
        .await?;

    signal_handle.await?;
    db.close().await;
    info!("Server stopped gracefully");

    Ok(())
}

/// Open the store, create the schema and reseed it
///
/// Every failure here is fatal for startup.
pub async fn prepare_database(config: &Config) -> Result<Database> {
    let db = Database::open(&config.database).await?;
    db.ensure_schema().await?;

    let mut session = db.acquire_session().await?;
    db::reseed(&mut session)
        .await
        .context("Failed to seed user table")?;

    Ok(db)
}

/// Create the Axum router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    let routes = Router::new()
        .route("/", get(handlers::root::root))
        .route("/health", get(handlers::health::health_check))
        .route("/users", get(handlers::users::list_users))
        .with_state(state);

    with_middleware(routes)
}

/// Panic catching and request tracing, applied around every route
pub fn with_middleware(routes: Router) -> Router {
    routes
        .layer(CatchPanicLayer::custom(error::handle_panic))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(MakeRequestSpan)
                .on_response(RecordResponse),
        )
}
