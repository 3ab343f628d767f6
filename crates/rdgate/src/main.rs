//! rdgate - Real-Debrid gateway with OAuth device-flow sessions
//!
//! Main entry point for the rdgate server.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use rdgate_server::config::DEFAULT_PORT;
use rdgate_server::routes::TOOLS;
use rdgate_server::{Server, ServerConfig};
use tracing_appender::non_blocking::WorkerGuard;

// ─────────────────────────────────────────────────────────────────────────────
// CLI Structure
// ─────────────────────────────────────────────────────────────────────────────

/// rdgate - Real-Debrid gateway with OAuth device-flow sessions
#[derive(Parser, Debug)]
#[command(name = "rdgate")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Address to bind
    #[arg(long, env = "RDGATE_HOST", default_value = "0.0.0.0")]
    pub host: IpAddr,

    /// Real-Debrid REST API base URL
    #[arg(long, env = "RDGATE_API_BASE")]
    pub api_base: Option<String>,

    /// Real-Debrid OAuth base URL
    #[arg(long, env = "RDGATE_OAUTH_BASE")]
    pub oauth_base: Option<String>,

    /// Timeout for each upstream request, in seconds
    #[arg(
        long,
        env = "RDGATE_TIMEOUT_SECS",
        default_value_t = 30,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub timeout_secs: u64,

    /// Disable permissive CORS headers
    #[arg(long)]
    pub no_cors: bool,

    /// Also write JSON logs to a daily-rolling file in this directory
    #[arg(long)]
    pub log_dir: Option<PathBuf>,

    /// Emit console logs as JSON
    #[arg(long)]
    pub json_logs: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    fn server_config(&self) -> ServerConfig {
        let mut config = ServerConfig::new()
            .with_bind_address(SocketAddr::new(self.host, self.port))
            .with_timeout(Duration::from_secs(self.timeout_secs))
            .with_cors(!self.no_cors);

        if let Some(url) = &self.api_base {
            config = config.with_api_base_url(url.as_str());
        }
        if let Some(url) = &self.oauth_base {
            config = config.with_oauth_base_url(url.as_str());
        }
        config
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Logging
// ─────────────────────────────────────────────────────────────────────────────

fn console_filter(verbose: bool) -> tracing_subscriber::EnvFilter {
    let default = if verbose {
        "rdgate=debug,rdgate_server=debug,rdgate_oauth=debug,tower_http=debug,info"
    } else {
        "rdgate=info,rdgate_server=info,rdgate_oauth=info,warn"
    };
    tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default))
}

/// Console (human-readable or JSON) plus an optional rotating JSON file.
/// The returned guard must be held until exit so buffered lines are flushed.
fn init_tracing(cli: &Cli) -> Option<WorkerGuard> {
    use tracing_subscriber::prelude::*;

    let (file_layer, guard) = match &cli.log_dir {
        Some(dir) => {
            let file_appender = tracing_appender::rolling::daily(dir, "rdgate.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let layer = tracing_subscriber::fmt::layer()
                .json()
                .with_writer(non_blocking)
                .with_filter(tracing_subscriber::EnvFilter::new(
                    "rdgate=trace,rdgate_server=trace,rdgate_oauth=trace,info",
                ));
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let json_console = cli.json_logs.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .with_filter(console_filter(cli.verbose))
    });
    let plain_console = (!cli.json_logs).then(|| {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_filter(console_filter(cli.verbose))
    });

    tracing_subscriber::registry()
        .with(json_console)
        .with(plain_console)
        .with(file_layer)
        .init();

    guard
}

// ─────────────────────────────────────────────────────────────────────────────
// Main
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _guard = init_tracing(&cli);

    let config = cli.server_config();
    let addr = config.bind_address;

    println!("rdgate v{}", env!("CARGO_PKG_VERSION"));
    println!("Listening on: http://{}", addr);
    println!("Health check: http://{}/health", addr);
    println!("MCP endpoint: http://{}/mcp", addr);
    println!("Real-Debrid API: {}", config.api_base_url);
    println!(
        "Tools ({}): {}",
        TOOLS.len(),
        TOOLS
            .iter()
            .map(|(name, _)| *name)
            .collect::<Vec<_>>()
            .join(", ")
    );
    println!("Start with oauth_start, then poll oauth_check for a session_id");

    tracing::info!(
        %addr,
        timeout_secs = cli.timeout_secs,
        cors = !cli.no_cors,
        "Configuration loaded"
    );

    let server = Server::new(config).context("failed to initialise server")?;
    server.run().await.context("server exited with error")?;

    Ok(())
}
