use anyhow::Result;
use colored::Colorize;
use otel_demo::{config, server, telemetry};
use std::path::Path;
use tracing::info;

/// Execute the start command
///
/// This will:
/// 1. Load configuration
/// 2. Initialize telemetry (console logging plus OTLP export)
/// 3. Start the server and block until shutdown
/// 4. Flush buffered spans and logs
pub async fn execute(config_path: &Path, simulate_errors: bool) -> Result<()> {
    println!("{}", "Starting server in foreground mode...".green());

    let mut cfg = config::load_config(config_path)?;
    if simulate_errors {
        cfg.server.simulate_errors = true;
    }

    let guard = telemetry::init(&cfg.telemetry, &cfg.server)?;
    info!(config = %config_path.display(), "Configuration loaded");

    let result = server::start_server(cfg).await;

    if let Err(e) = &result {
        tracing::error!(error = %e, "Server exited with error");
    }

    // Shutdown blocks while the batch processors drain
    info!("Flushing telemetry...");
    tokio::task::spawn_blocking(move || guard.shutdown()).await?;

    result
}
