//! Forwarding errors.
//!
//! Every variant ends the same way downstream: the fallback 500. The detail
//! only ever reaches the log.

use std::time::Duration;

use axum::http::uri::InvalidUri;

#[derive(Debug, thiserror::Error)]
pub enum ForwardError {
    #[error("invalid upstream target: {0}")]
    InvalidTarget(#[from] InvalidUri),

    #[error("failed to build upstream request: {0}")]
    Build(#[from] axum::http::Error),

    #[error("failed to read request body: {0}")]
    RequestBody(#[source] axum::Error),

    #[error("upstream request failed: {0}")]
    Connect(#[from] hyper_util::client::legacy::Error),

    #[error("upstream did not respond within {0:?}")]
    Timeout(Duration),

    #[error("failed to read upstream response body: {0}")]
    ResponseBody(#[source] axum::Error),
}

impl ForwardError {
    /// Metric label for the failure.
    pub fn reason(&self) -> &'static str {
        match self {
            ForwardError::InvalidTarget(_) | ForwardError::Build(_) => "request",
            ForwardError::RequestBody(_) | ForwardError::ResponseBody(_) => "body",
            ForwardError::Connect(_) => "connect",
            ForwardError::Timeout(_) => "timeout",
        }
    }
}
