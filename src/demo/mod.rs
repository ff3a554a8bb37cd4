//! Stand-in upstream service.
//!
//! Serves the session, device and chat endpoints of the real API plus an
//! echo endpoint, so the gateway can be run and tested without the inference
//! service. State is injected through [`DemoState`]; nothing is global.

pub mod auth;
pub mod chat;
pub mod devices;
pub mod users;

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::DefaultBodyLimit,
    http::{header, HeaderMap, Method, Uri},
    routing::{any, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;

use crate::sessions::{MemorySessionStore, SessionStore};
use chat::ChatLog;
use devices::DeviceRegistry;
use users::UserDirectory;

#[derive(Clone)]
pub struct DemoState {
    pub sessions: Arc<dyn SessionStore>,
    pub users: Arc<UserDirectory>,
    pub devices: Arc<DeviceRegistry>,
    pub chat: Arc<ChatLog>,
}

impl DemoState {
    pub fn new(sessions: Arc<dyn SessionStore>) -> Self {
        Self {
            sessions,
            users: Arc::new(UserDirectory::new()),
            devices: Arc::new(DeviceRegistry::with_mock_devices()),
            chat: Arc::new(ChatLog::new()),
        }
    }
}

impl Default for DemoState {
    fn default() -> Self {
        Self::new(Arc::new(MemorySessionStore::new()))
    }
}

pub fn router(state: DemoState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/oidc-login", post(auth::oidc_login))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/session", get(auth::session))
        .route("/api/devices", get(devices::list))
        .route("/api/devices/scan", post(devices::scan))
        .route("/api/devices/{id}/connect", post(devices::connect))
        .route("/api/devices/{id}/disconnect", post(devices::disconnect))
        .route("/api/chat/messages", get(chat::messages))
        .route("/api/chat/message", post(chat::send_message))
        .route("/api/echo", any(echo))
        .route("/api/echo/{*rest}", any(echo))
        .with_state(state)
        .layer(DefaultBodyLimit::max(4 * chat::MAX_IMAGE_BYTES))
        .layer(TraceLayer::new_for_http())
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "edge-gateway-demo-upstream",
    }))
}

/// What the echo endpoint saw.
#[derive(Debug, Serialize, Deserialize)]
pub struct Echo {
    pub method: String,
    pub uri: String,
    pub headers: BTreeMap<String, Vec<String>>,
    pub content_type: Option<String>,
    pub body_len: usize,
    pub body: String,
}

async fn echo(
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Json<Echo> {
    let mut seen: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (name, value) in &headers {
        seen.entry(name.as_str().to_string())
            .or_default()
            .push(String::from_utf8_lossy(value.as_bytes()).into_owned());
    }

    Json(Echo {
        method: method.to_string(),
        uri: uri.to_string(),
        content_type: headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        headers: seen,
        body_len: body.len(),
        body: String::from_utf8_lossy(&body).into_owned(),
    })
}
