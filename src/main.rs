//! Database gateway entry point.
//!
//! Initializes logging, loads configuration, connects the adapters and serves
//! the MCP tool surface on the configured transport.

use anyhow::Result;
use tracing::{Level, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use db_gateway_mcp::core::{Config, McpServer, TransportService};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env();

    init_logging(&config.logging.level);

    info!("Starting {} v{}", config.server.name, config.server.version);
    config.log_summary();

    let transport = TransportService::new(config.transport.clone());
    let server = McpServer::from_config(config);
    let registry = server.registry().clone();

    let connected = registry
        .connect_all()
        .await
        .into_iter()
        .filter(|(_, outcome)| outcome.is_ok())
        .count();
    info!(
        "{} of {} adapters connected, {} tools registered",
        connected,
        registry.adapters().len(),
        registry.tool_names().len()
    );

    let outcome = transport.run(server).await;
    if let Err(e) = &outcome {
        warn!("Transport stopped with error: {}", e);
    }

    info!("Server shutting down");
    registry.disconnect_all().await;

    outcome?;
    Ok(())
}

/// Initialize the logging subsystem.
///
/// Logs go to stderr; stdout carries the STDIO transport. `RUST_LOG`
/// directives are honored on top of the configured level.
fn init_logging(level: &str) {
    let level = match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .init();
}
