//! Issue forwarder service binary.
//!
//! Standalone HTTP service hosting the Jira issue web trigger.
//!
//! # Environment Variables
//!
//! - `API_KEY` - Shared secret callers send in `x-api-key` (required)
//! - `JIRA_BASE_URL` - Jira site URL (required)
//! - `JIRA_EMAIL` - Jira account email (required)
//! - `JIRA_API_TOKEN` - Jira API token (required)
//! - `FORWARDER_PORT` - Listen port (default 8080)
//! - `LOG_FORMAT` - Set to `json` for JSON log lines

use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use issue_forwarder::{server, Config, IssueForwarder};

/// Web trigger that forwards authenticated requests into Jira issue creation.
#[derive(Parser)]
#[command(name = "issue-forwarder")]
#[command(version)]
struct Cli {
    /// Listen port (overrides `FORWARDER_PORT`)
    #[arg(long)]
    port: Option<u16>,

    /// Maximum inbound body size in bytes (overrides `FORWARDER_MAX_BODY_BYTES`)
    #[arg(long)]
    max_body_bytes: Option<usize>,

    /// Log output format
    #[arg(long, env = "LOG_FORMAT", default_value = "text")]
    log_format: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = EnvFilter::from_default_env()
        .add_directive("issue_forwarder=info".parse()?)
        .add_directive("tower_http=info".parse()?);
    if cli.log_format.eq_ignore_ascii_case("json") {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer())
            .with(filter)
            .init();
    }

    info!("Starting issue forwarder...");

    // Load configuration
    let mut config = Config::from_env().context("Failed to load configuration")?;
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(max_body_bytes) = cli.max_body_bytes {
        config.max_body_bytes = max_body_bytes;
    }

    let forwarder =
        IssueForwarder::from_config(&config).context("Failed to create Jira client")?;
    info!(jira_base_url = %config.jira_base_url, "Jira API client configured");

    let state = server::AppState {
        forwarder: Arc::new(forwarder),
    };
    let app = server::build_router(state, config.max_body_bytes);

    // Bind and serve
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!(port = config.port, "Issue forwarder listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Issue forwarder stopped");
    Ok(())
}

/// Resolve on Ctrl-C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Shutdown signal received");
}
