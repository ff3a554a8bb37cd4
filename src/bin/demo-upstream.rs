//! Stand-in upstream for running the gateway locally.

use clap::Parser;
use tokio::net::TcpListener;

use edge_gateway::config::ObservabilityConfig;
use edge_gateway::demo::{self, DemoState};
use edge_gateway::lifecycle::signals;
use edge_gateway::observability;

#[derive(Parser)]
#[command(name = "demo-upstream")]
#[command(about = "Stand-in API service for the edge gateway", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "127.0.0.1:8000")]
    bind: String,

    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    observability::logging::init(&ObservabilityConfig {
        log_level: cli.log_level,
        ..ObservabilityConfig::default()
    });

    let listener = TcpListener::bind(&cli.bind).await?;
    tracing::info!(address = %listener.local_addr()?, "Demo upstream listening");

    axum::serve(listener, demo::router(DemoState::default()))
        .with_graceful_shutdown(async {
            let signal = signals::wait_for_termination().await;
            tracing::info!(signal, "Demo upstream shutting down");
        })
        .await?;

    Ok(())
}
