//! OS signal handling.
//!
//! SIGINT and SIGTERM both mean "shut down": stop serving, terminate the
//! upstream child, exit. Registered once, from `main`.

/// Resolve when the process is asked to terminate. Returns the signal name.
#[cfg(unix)]
pub async fn wait_for_termination() -> &'static str {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = match signal(SignalKind::terminate()) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "Failed to install SIGTERM handler");
            return wait_for_interrupt().await;
        }
    };

    tokio::select! {
        name = wait_for_interrupt() => name,
        _ = terminate.recv() => "SIGTERM",
    }
}

/// Resolve when the process is asked to terminate. Returns the signal name.
#[cfg(not(unix))]
pub async fn wait_for_termination() -> &'static str {
    wait_for_interrupt().await
}

async fn wait_for_interrupt() -> &'static str {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    "SIGINT"
}
