//! Responses the gateway produces itself.
//!
//! Forwarded responses are built in `forward::response`; this covers paths
//! outside the API prefix.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// `{"message": ...}` error body used by the gateway shell.
#[derive(Debug, Serialize)]
pub struct MessageBody {
    pub message: String,
}

pub fn message_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(MessageBody {
            message: message.into(),
        }),
    )
        .into_response()
}

/// Fallback for every route the gateway does not own.
pub async fn not_found() -> Response {
    message_response(StatusCode::NOT_FOUND, "Not Found")
}
