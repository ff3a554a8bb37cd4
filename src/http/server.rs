//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the gateway handler
//! - Wire up middleware (access log, tracing)
//! - Dispatch API-prefixed requests to the forwarder
//! - Serve until shutdown, then drain

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware,
    response::Response,
    Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;

use crate::config::GatewayConfig;
use crate::forward::Forwarder;
use crate::http::middleware::{access_log_middleware, AccessLog};
use crate::http::response::not_found;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub forwarder: Forwarder,
    pub api_prefix: Arc<str>,
}

impl AppState {
    /// Whether `path` belongs to the forwarded API space.
    pub fn is_api_path(&self, path: &str) -> bool {
        path.strip_prefix(&*self.api_prefix)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
    }
}

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
    config: GatewayConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: GatewayConfig) -> Self {
        let state = AppState {
            forwarder: Forwarder::new(&config.upstream),
            api_prefix: Arc::from(config.upstream.api_prefix.as_str()),
        };

        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        let access = AccessLog::new(config.upstream.api_prefix.as_str());

        Router::new()
            .fallback(gateway_handler)
            .with_state(state)
            .layer(middleware::from_fn_with_state(access, access_log_middleware))
            .layer(TraceLayer::new_for_http())
    }

    /// The router, for driving the gateway without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until a shutdown signal arrives on `shutdown`.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            upstream = %self.config.upstream.origin,
            api_prefix = %self.config.upstream.api_prefix,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Forwards API requests; everything else is not ours.
async fn gateway_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    if state.is_api_path(request.uri().path()) {
        state.forwarder.forward(request).await
    } else {
        not_found().await
    }
}
