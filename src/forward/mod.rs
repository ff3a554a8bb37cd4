//! Request forwarding subsystem.
//!
//! # Data Flow
//! ```text
//! inbound request under the API prefix
//!     → target: <origin><path and query>, untouched
//!     → headers.rs (drop host, join repeated values)
//!     → body.rs (pick ForwardBody once: none | json | multipart | raw)
//!     → hyper-util client → upstream
//!     → response.rs (copy status + headers, re-emit JSON or relay bytes)
//!     → downstream response
//!
//! any failure on the way
//!     → error.rs (ForwardError, logged)
//!     → 500 {"error":"Backend service unavailable"}
//! ```
//!
//! # Design Decisions
//! - No retries: a failed forward is answered once with the fallback
//! - Nothing is written downstream until the outcome is known
//! - No per-request state is shared between requests

pub mod body;
pub mod error;
pub mod headers;
pub mod response;

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::http::{Method, Request, Uri};
use axum::response::{IntoResponse, Response};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};

use crate::config::UpstreamConfig;
use crate::observability::metrics;

pub use body::ForwardBody;
pub use error::ForwardError;
pub use response::{fallback_response, RelayedResponse, FALLBACK_ERROR};

/// Forwards requests to a single upstream origin.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Clone)]
pub struct Forwarder {
    client: Client<HttpConnector, Body>,
    origin: Arc<str>,
    max_body_bytes: usize,
    timeout: Option<Duration>,
}

impl Forwarder {
    pub fn new(config: &UpstreamConfig) -> Self {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());

        Self {
            client,
            origin: Arc::from(config.origin.trim_end_matches('/')),
            max_body_bytes: config.max_body_bytes,
            timeout: config.timeout_secs.map(Duration::from_secs),
        }
    }

    /// Upstream URI for an inbound URI: the origin followed by the exact path and query.
    pub fn target_for(&self, uri: &Uri) -> Result<Uri, ForwardError> {
        let path_and_query = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
        Ok(format!("{}{}", self.origin, path_and_query).parse()?)
    }

    /// Forward one request and produce exactly one response.
    pub async fn forward(&self, request: Request<Body>) -> Response {
        let started = Instant::now();
        let method = request.method().clone();
        let uri = request.uri().clone();

        match self.round_trip(request).await {
            Ok(relayed) => {
                tracing::debug!(
                    method = %method,
                    uri = %uri,
                    status = relayed.status.as_u16(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Upstream responded"
                );
                relayed.into_response()
            }
            Err(e) => {
                tracing::error!(
                    method = %method,
                    uri = %uri,
                    error = %e,
                    detail = ?e,
                    "Proxy error"
                );
                metrics::record_upstream_failure(e.reason());
                fallback_response()
            }
        }
    }

    async fn round_trip(&self, request: Request<Body>) -> Result<RelayedResponse, ForwardError> {
        let (parts, body) = request.into_parts();
        let target = self.target_for(&parts.uri)?;

        let mut headers = headers::outbound_headers(&parts.headers);
        let body = ForwardBody::collect(&parts.method, &parts.headers, body, self.max_body_bytes).await?;
        body.apply_headers(&mut headers);

        tracing::debug!(
            method = %parts.method,
            target = %target,
            body = body.kind(),
            "Proxying request"
        );

        let outbound = build_request(parts.method, target, headers, body)?;

        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.send(outbound))
                .await
                .map_err(|_| ForwardError::Timeout(limit))?,
            None => self.send(outbound).await,
        }
    }

    async fn send(&self, outbound: Request<Body>) -> Result<RelayedResponse, ForwardError> {
        let response = self.client.request(outbound).await?;
        RelayedResponse::collect(response, self.max_body_bytes).await
    }
}

fn build_request(
    method: Method,
    target: Uri,
    headers: axum::http::HeaderMap,
    body: ForwardBody,
) -> Result<Request<Body>, ForwardError> {
    let mut request = Request::builder().method(method).uri(target).body(body.into_body())?;
    *request.headers_mut() = headers;
    Ok(request)
}
