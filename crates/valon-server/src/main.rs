//! Valon server - real-time command processing over WebSocket.

use anyhow::Result;
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use valon_server::{config::Config, logging, routes, state::AppState};

use logging::{LogConfig, LogFormat, LogPreset};

/// Valon agent - command processing service with live status broadcast.
#[derive(Parser, Debug)]
#[command(name = "valon-server")]
#[command(about = "HTTP/WebSocket server for the Valon command engine")]
#[command(version)]
struct Cli {
    /// Path to config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override port from config (falls back to $PORT)
    #[arg(short, long)]
    port: Option<u16>,

    /// Enable verbose logging (per-command activity)
    #[arg(short, long)]
    verbose: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Enable trace logging (TRACE level for everything)
    #[arg(long)]
    trace: bool,

    /// Quiet mode (WARN and ERROR only)
    #[arg(short, long)]
    quiet: bool,

    /// Set log level for specific targets (e.g., "engine=debug" or "ws::ping=trace").
    /// Can be specified multiple times. Targets are prefixed with "valon::" automatically.
    #[arg(long = "log", value_name = "TARGET=LEVEL")]
    log_overrides: Vec<String>,

    /// Log output format
    #[arg(long = "log-format", value_name = "FORMAT", default_value = "text")]
    log_format: LogFormat,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let preset = LogPreset::from_flags(cli.verbose, cli.debug, cli.trace, cli.quiet);
    logging::init(&LogConfig::new(preset, &cli.log_overrides, cli.log_format));

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    // CLI beats $PORT, which beats the file
    if let Some(port) = cli.port.or_else(Config::port_from_env) {
        config.port = port;
    }

    tracing::info!(
        target: "valon::startup",
        "Loaded configuration (port: {}, max tasks: {}, max sessions: {})",
        config.port, config.max_tasks, config.max_sessions
    );

    let state = Arc::new(AppState::new(config.clone())?);
    tracing::info!(target: "valon::startup", "Initialized {} engine", config.agent_name);

    let app = routes::app(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    tracing::info!(target: "valon::startup", "Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;

    Ok(())
}
