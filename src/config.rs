use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    #[serde(default)]
    pub outbound: OutboundConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Fallback filter when RUST_LOG is not set
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// "text" or "json"
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Make `GET /users` log at every level and then fail with a 500
    #[serde(default)]
    pub simulate_errors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
            log_format: default_log_format(),
            simulate_errors: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// SQLite connection URL (default: "sqlite://database.db")
    #[serde(default = "default_database_url")]
    pub url: String,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Log every SQL statement through sqlx
    #[serde(default)]
    pub echo: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: default_max_connections(),
            echo: false,
        }
    }
}

/// OpenTelemetry export settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TelemetryConfig {
    /// Export traces and logs over OTLP (default: true)
    #[serde(default = "default_telemetry_enabled")]
    pub enabled: bool,

    #[serde(default = "default_service_name")]
    pub service_name: String,

    #[serde(default = "default_service_version")]
    pub service_version: String,

    /// Collector gRPC endpoint, plaintext (default: "http://localhost:4317")
    #[serde(default = "default_otlp_endpoint")]
    pub otlp_endpoint: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: default_telemetry_enabled(),
            service_name: default_service_name(),
            service_version: default_service_version(),
            otlp_endpoint: default_otlp_endpoint(),
        }
    }
}

/// Third-party endpoint called once per listed user
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutboundConfig {
    #[serde(default = "default_outbound_enabled")]
    pub enabled: bool,

    #[serde(default = "default_outbound_url")]
    pub url: String,
}

impl Default for OutboundConfig {
    fn default() -> Self {
        Self {
            enabled: default_outbound_enabled(),
            url: default_outbound_url(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_database_url() -> String {
    "sqlite://database.db".to_string()
}

fn default_max_connections() -> u32 {
    5
}

fn default_telemetry_enabled() -> bool {
    true
}

fn default_service_name() -> String {
    "otel-demo".to_string()
}

fn default_service_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn default_otlp_endpoint() -> String {
    "http://localhost:4317".to_string()
}

fn default_outbound_enabled() -> bool {
    true
}

fn default_outbound_url() -> String {
    "https://randomuser.me/api/".to_string()
}

/// Load configuration from an optional TOML file and `OTEL_DEMO_*` environment variables
///
/// Nested keys use `__`, e.g. `OTEL_DEMO_SERVER__PORT=9000`.
pub fn load_config(path: &Path) -> anyhow::Result<Config> {
    let config = config::Config::builder()
        .add_source(config::File::from(path).required(false))
        .add_source(
            config::Environment::with_prefix("OTEL_DEMO")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    let cfg: Config = config.try_deserialize()?;
    validate_config(&cfg)?;

    Ok(cfg)
}

fn validate_config(cfg: &Config) -> anyhow::Result<()> {
    if cfg.server.host.parse::<std::net::IpAddr>().is_err() {
        anyhow::bail!("Invalid server host: {}", cfg.server.host);
    }

    if cfg.server.port == 0 {
        anyhow::bail!("Server port must be non-zero");
    }

    match cfg.server.log_format.as_str() {
        "text" | "json" => {}
        other => anyhow::bail!("Invalid log format '{}', expected 'text' or 'json'", other),
    }

    if !cfg.database.url.starts_with("sqlite:") {
        anyhow::bail!("Database URL must use the sqlite scheme: {}", cfg.database.url);
    }

    if cfg.database.max_connections == 0 {
        anyhow::bail!("Database max_connections must be at least 1");
    }

    if cfg.telemetry.enabled {
        if cfg.telemetry.service_name.trim().is_empty() {
            anyhow::bail!("Telemetry service name cannot be empty");
        }
        if let Err(e) = reqwest::Url::parse(&cfg.telemetry.otlp_endpoint) {
            anyhow::bail!("Invalid OTLP endpoint '{}': {}", cfg.telemetry.otlp_endpoint, e);
        }
    }

    if cfg.outbound.enabled {
        if let Err(e) = reqwest::Url::parse(&cfg.outbound.url) {
            anyhow::bail!("Invalid outbound URL '{}': {}", cfg.outbound.url, e);
        }
    }

    Ok(())
}
