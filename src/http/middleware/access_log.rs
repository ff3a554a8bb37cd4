//! Access log middleware.
//! One line per completed API request, plus request metrics for every request.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use tracing::Instrument;

use crate::http::request::RequestId;
use crate::observability::logging::{self, CapturedJson};
use crate::observability::metrics;

/// Which paths get an access line.
#[derive(Clone, Debug)]
pub struct AccessLog {
    api_prefix: Arc<str>,
}

impl AccessLog {
    pub fn new(api_prefix: impl Into<Arc<str>>) -> Self {
        Self {
            api_prefix: api_prefix.into(),
        }
    }

    pub fn covers(&self, path: &str) -> bool {
        path.starts_with(&*self.api_prefix)
    }
}

pub async fn access_log_middleware(
    State(access): State<AccessLog>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let started = Instant::now();
    let request_id = RequestId::new();
    req.extensions_mut().insert(request_id);

    let method = req.method().clone();
    let path = req.uri().path().to_owned();
    let span = tracing::info_span!(
        "request",
        request_id = %request_id,
        method = %method,
        path = %path,
    );

    let response = next.run(req).instrument(span.clone()).await;
    let status = response.status().as_u16();
    metrics::record_request(method.as_str(), status, started);

    if access.covers(&path) {
        let elapsed_ms = started.elapsed().as_millis();
        let captured = response.extensions().get::<CapturedJson>().map(|c| &c.0);
        let line = logging::access_line(method.as_str(), &path, status, elapsed_ms, captured);
        span.in_scope(|| {
            tracing::info!(
                target: "access",
                status,
                elapsed_ms = elapsed_ms as u64,
                "{line}"
            );
        });
    }

    response
}
