//! Gateway entry point.
//!
//! Initializes logging, loads configuration and starts the configured front
//! end (MCP over stdio/TCP/HTTP, or the REST server).

use anyhow::{Context, Result};
use tracing::{Level, info};
use tracing_subscriber::{EnvFilter, fmt};

use piperun_gateway::core::{Config, LoggingConfig, McpServer, TransportService};

#[tokio::main]
async fn main() -> Result<()> {
    init_logging(&LoggingConfig::from_env().level);

    let config = Config::from_env();

    info!("Starting {} v{}", config.server.name, config.server.version);
    info!(
        "Upstream: {} (timeout {}s, {} retries from {}ms)",
        config.upstream.base_url,
        config.upstream.timeout_secs,
        config.retry.max_retries,
        config.retry.initial_delay_ms
    );

    let server = McpServer::new(config.clone()).context("failed to initialize gateway")?;

    let transport = TransportService::new(config.transport);
    transport.run(server).await?;

    info!("Gateway shutting down");

    Ok(())
}

/// Initialize the logging subsystem.
///
/// Logs always go to stderr so stdout stays free for the STDIO transport.
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
