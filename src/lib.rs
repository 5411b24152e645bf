pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod server;
pub mod signals;
pub mod telemetry;
pub mod upstream;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize console-only tracing/logging
///
/// Used by commands that never start the server; `start` goes through
/// [`telemetry::init`] instead.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .init();
}
