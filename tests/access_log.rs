//! Access lines as the gateway actually emits them.

use std::io;
use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::routing::get;
use axum::{Json, Router};
use edge_gateway::config::GatewayConfig;
use edge_gateway::HttpServer;
use serde_json::json;
use tower::ServiceExt;
use tracing_subscriber::fmt::MakeWriter;

mod common;

/// Collects formatted log output in memory.
#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl Captured {
    fn lines(&self) -> Vec<String> {
        let buf = self.0.lock().unwrap();
        String::from_utf8_lossy(&buf)
            .lines()
            .map(str::to_string)
            .collect()
    }
}

impl io::Write for Captured {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(bytes);
        Ok(bytes.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for Captured {
    type Writer = Captured;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Route `access` events on this thread into a buffer.
fn capture() -> (Captured, tracing::subscriber::DefaultGuard) {
    let captured = Captured::default();
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter("access=info")
        .with_writer(captured.clone())
        .with_ansi(false)
        .without_time()
        .finish();
    let guard = tracing::subscriber::set_default(subscriber);
    (captured, guard)
}

fn router_for(upstream: std::net::SocketAddr) -> Router {
    let mut config = GatewayConfig::default();
    config.upstream.origin = format!("http://{}", upstream);
    config.supervisor.enabled = false;
    HttpServer::new(config).router()
}

async fn get_status(router: &Router, uri: &str) -> StatusCode {
    let response = router
        .clone()
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    axum::body::to_bytes(response.into_body(), 1 << 20).await.unwrap();
    status
}

#[tokio::test]
async fn relayed_json_is_logged_once() {
    let upstream = common::spawn_upstream(Router::new().route(
        "/api/devices",
        get(|| async { Json(json!({ "zeta": 1, "alpha": 2 })) }),
    ))
    .await;
    let router = router_for(upstream);
    let (captured, _guard) = capture();

    assert_eq!(get_status(&router, "/api/devices?verbose=1").await, StatusCode::OK);

    let lines = captured.lines();
    assert_eq!(lines.len(), 1, "{lines:?}");
    assert!(lines[0].contains("access: GET /api/devices 200 in "), "{}", lines[0]);
    assert!(lines[0].contains(r#"ms :: {"zeta":1,"alpha":2}"#), "{}", lines[0]);
    assert!(!lines[0].contains("verbose"));
}

#[tokio::test]
async fn fallback_body_is_logged() {
    let upstream = common::unused_addr().await;
    let router = router_for(upstream);
    let (captured, _guard) = capture();

    assert_eq!(
        get_status(&router, "/api/chat/messages").await,
        StatusCode::INTERNAL_SERVER_ERROR
    );

    let lines = captured.lines();
    assert_eq!(lines.len(), 1, "{lines:?}");
    assert!(lines[0].contains("access: GET /api/chat/messages 500 in "));
    assert!(lines[0].contains(r#":: {"error":"Backend service unavailable"}"#));
}

#[tokio::test]
async fn long_lines_are_truncated() {
    let upstream = common::spawn_upstream(Router::new().route(
        "/api/chat/messages",
        get(|| async { Json(json!({ "content": "x".repeat(200) })) }),
    ))
    .await;
    let router = router_for(upstream);
    let (captured, _guard) = capture();

    get_status(&router, "/api/chat/messages").await;

    let lines = captured.lines();
    assert_eq!(lines.len(), 1, "{lines:?}");
    let message = lines[0]
        .split_once("access: ")
        .map(|(_, rest)| rest)
        .unwrap();
    let access_line = message.split(" status=").next().unwrap();
    assert_eq!(access_line.chars().count(), 80);
    assert!(access_line.ends_with('…'));
}

#[tokio::test]
async fn paths_outside_the_prefix_are_not_logged() {
    let upstream = common::unused_addr().await;
    let router = router_for(upstream);
    let (captured, _guard) = capture();

    assert_eq!(get_status(&router, "/login").await, StatusCode::NOT_FOUND);
    assert_eq!(get_status(&router, "/assets/app.js").await, StatusCode::NOT_FOUND);

    assert!(captured.lines().is_empty());
}
