//! Upstream response relay and the fallback response.

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use hyper::body::Incoming;

use crate::forward::body::is_json;
use crate::forward::error::ForwardError;
use crate::forward::headers::strip_framing;
use crate::observability::logging::CapturedJson;

/// Message returned to callers whenever the upstream cannot be reached.
pub const FALLBACK_ERROR: &str = "Backend service unavailable";

/// A fully collected upstream response, ready to write downstream.
#[derive(Debug)]
pub struct RelayedResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
    /// The JSON value behind `body`, when the upstream declared and sent JSON.
    pub json: Option<serde_json::Value>,
}

impl RelayedResponse {
    /// Collect an upstream response.
    ///
    /// JSON bodies are parsed and re-serialized. A body declared as JSON that
    /// does not parse is relayed byte for byte instead.
    pub async fn collect(response: Response<Incoming>, limit: usize) -> Result<Self, ForwardError> {
        let (parts, body) = response.into_parts();
        let bytes = axum::body::to_bytes(Body::new(body), limit)
            .await
            .map_err(ForwardError::ResponseBody)?;

        let mut headers = parts.headers;
        strip_framing(&mut headers);

        let declared_json = headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(is_json);

        let (body, json) = if declared_json {
            match serde_json::from_slice::<serde_json::Value>(&bytes) {
                Ok(value) => (Bytes::from(value.to_string()), Some(value)),
                Err(e) => {
                    tracing::warn!(
                        status = %parts.status,
                        error = %e,
                        "Upstream response declared JSON but did not parse, relaying raw body"
                    );
                    (bytes, None)
                }
            }
        } else {
            (bytes, None)
        };

        Ok(Self {
            status: parts.status,
            headers,
            body,
            json,
        })
    }
}

impl IntoResponse for RelayedResponse {
    fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        if let Some(value) = self.json {
            response.extensions_mut().insert(CapturedJson(value));
        }
        response
    }
}

/// `500 {"error":"Backend service unavailable"}`.
pub fn fallback_response() -> Response {
    let body = serde_json::json!({ "error": FALLBACK_ERROR });
    let mut response = (StatusCode::INTERNAL_SERVER_ERROR, Json(body.clone())).into_response();
    response.extensions_mut().insert(CapturedJson(body));
    response
}
