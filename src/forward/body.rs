//! Request body strategy.
//!
//! The strategy is decided once per request from the method and the inbound
//! `content-type`, then carried through the rest of the pipeline.

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderMap, HeaderValue, Method};

use crate::forward::error::ForwardError;

const MULTIPART_FORM_DATA: &str = "multipart/form-data";
const APPLICATION_JSON: &str = "application/json";

/// Body sent upstream.
#[derive(Debug, Clone, PartialEq)]
pub enum ForwardBody {
    /// Nothing attached.
    None,
    /// Parsed JSON, re-serialized when sent.
    Json(serde_json::Value),
    /// Exact bytes of a multipart stream. Never parsed.
    Multipart(Bytes),
    /// Any other payload, relayed verbatim.
    RawText(Bytes),
}

impl ForwardBody {
    /// Collect the inbound body according to the strategy for `method` and `headers`.
    ///
    /// Only POST, PUT and PATCH carry a body upstream; for every other method
    /// the inbound body is dropped without being read.
    pub async fn collect(
        method: &Method,
        headers: &HeaderMap,
        body: Body,
        limit: usize,
    ) -> Result<Self, ForwardError> {
        if !carries_body(method) {
            return Ok(ForwardBody::None);
        }

        let content_type = content_type(headers);
        let bytes = axum::body::to_bytes(body, limit)
            .await
            .map_err(ForwardError::RequestBody)?;

        if content_type.contains(MULTIPART_FORM_DATA) {
            return Ok(ForwardBody::Multipart(bytes));
        }

        if bytes.is_empty() {
            return Ok(ForwardBody::None);
        }

        if content_type.contains(APPLICATION_JSON) {
            return match serde_json::from_slice(&bytes) {
                Ok(value) => Ok(ForwardBody::Json(value)),
                Err(e) => {
                    tracing::warn!(error = %e, len = bytes.len(), "Request body is not valid JSON, forwarding verbatim");
                    Ok(ForwardBody::RawText(bytes))
                }
            };
        }

        Ok(ForwardBody::RawText(bytes))
    }

    /// Short label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ForwardBody::None => "none",
            ForwardBody::Json(_) => "json",
            ForwardBody::Multipart(_) => "multipart",
            ForwardBody::RawText(_) => "raw",
        }
    }

    /// Fill in headers the body implies but the client left out.
    pub fn apply_headers(&self, headers: &mut HeaderMap) {
        if let ForwardBody::Json(_) = self {
            if !headers.contains_key(header::CONTENT_TYPE) {
                headers.insert(
                    header::CONTENT_TYPE,
                    HeaderValue::from_static(APPLICATION_JSON),
                );
            }
        }
    }

    pub fn into_body(self) -> Body {
        match self {
            ForwardBody::None => Body::empty(),
            ForwardBody::Json(value) => Body::from(value.to_string()),
            ForwardBody::Multipart(bytes) | ForwardBody::RawText(bytes) => Body::from(bytes),
        }
    }
}

/// Methods whose body is forwarded upstream.
pub fn carries_body(method: &Method) -> bool {
    *method == Method::POST || *method == Method::PUT || *method == Method::PATCH
}

/// The `content-type` header as text, empty when absent or not UTF-8.
pub fn content_type(headers: &HeaderMap) -> &str {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

/// Whether a `content-type` value declares JSON.
pub fn is_json(content_type: &str) -> bool {
    content_type.contains(APPLICATION_JSON)
}
