//! Edge gateway (v1)
//!
//! Serves the browser-facing API by forwarding every `/api/*` request to the
//! upstream service it supervises.
//!
//! # Architecture Overview
//!
//! ```text
//!                     ┌───────────────────────────────────────────────┐
//!                     │                 EDGE GATEWAY                  │
//!   Client Request    │  ┌─────────┐    ┌────────────┐    ┌─────────┐ │
//!   ──────────────────┼─▶│  http   │───▶│ access log │───▶│ forward │─┼──▶ Upstream
//!                     │  │ server  │    │ middleware │    │         │ │    (127.0.0.1:8000)
//!   Client Response   │  └─────────┘    └────────────┘    └─────────┘ │
//!   ◀─────────────────┼──────────────────────────────────────────┘    │
//!                     │                                               │
//!                     │  ┌──────────┐  ┌───────────────┐  ┌────────┐  │
//!                     │  │  config  │  │ observability │  │ life-  │──┼──▶ spawns / stops
//!                     │  │          │  │ logs, metrics │  │ cycle  │  │    upstream child
//!                     │  └──────────┘  └───────────────┘  └────────┘  │
//!                     └───────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use edge_gateway::config::{resolve_config, Overrides};
use edge_gateway::lifecycle::signals;
use edge_gateway::observability;
use edge_gateway::{HttpServer, Shutdown, UpstreamSupervisor};

#[derive(Parser)]
#[command(name = "edge-gateway", version)]
#[command(about = "Serves the edge AI API by forwarding to its upstream service", long_about = None)]
struct Cli {
    /// TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listener address, overriding the file and PORT.
    #[arg(long)]
    bind: Option<String>,

    /// Upstream origin, e.g. http://127.0.0.1:8000.
    #[arg(long)]
    upstream: Option<String>,

    /// Do not spawn the upstream process.
    #[arg(long)]
    no_supervisor: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let overrides = Overrides {
        bind_address: cli.bind,
        port: std::env::var("PORT").ok(),
        upstream_origin: cli.upstream,
        disable_supervisor: cli.no_supervisor,
    };
    let config = resolve_config(cli.config.as_deref(), &overrides)?;

    observability::logging::init(&config.observability);

    tracing::info!("edge-gateway v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.origin,
        api_prefix = %config.upstream.api_prefix,
        supervisor = config.supervisor.enabled,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => observability::metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let mut supervisor = UpstreamSupervisor::new(config.supervisor.clone());
    if config.supervisor.enabled {
        if let Err(e) = supervisor.start() {
            tracing::error!(error = %e, "Upstream failed to start, API requests will get the fallback response");
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config);
    let mut server_task = tokio::spawn(server.run(listener, shutdown.subscribe()));

    let server_done = tokio::select! {
        signal = signals::wait_for_termination() => {
            tracing::info!(signal, "Termination signal received");
            shutdown.trigger();
            false
        }
        result = &mut server_task => {
            log_server_exit(result);
            true
        }
    };

    if let Err(e) = supervisor.stop().await {
        tracing::error!(error = %e, "Failed to stop upstream");
    }

    if !server_done {
        log_server_exit(server_task.await);
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

fn log_server_exit(result: Result<std::io::Result<()>, tokio::task::JoinError>) {
    match result {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::error!(error = %e, "HTTP server failed"),
        Err(e) => tracing::error!(error = %e, "HTTP server task panicked"),
    }
}
