use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;

use otel_demo::init_tracing;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let args = cli::Cli::parse();

    // The start command installs its own subscriber together with the OTLP pipeline
    let needs_early_tracing = !matches!(args.get_command(), cli::Commands::Start { .. });

    if needs_early_tracing {
        init_tracing();
    }

    // Dispatch to appropriate command handler
    match args.get_command() {
        cli::Commands::Start { simulate_errors } => {
            commands::start::execute(&args.config, simulate_errors).await?;
        }
        cli::Commands::Test => {
            commands::test::execute(&args.config)?;
        }
        cli::Commands::Version => {
            println!("otel-demo v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
