//! End-to-end forwarding behavior against in-process upstreams.

use std::time::Duration;

use axum::{
    body::Bytes,
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{any, get, post},
    Json, Router,
};
use edge_gateway::demo::{self, DemoState, Echo};
use serde_json::json;

mod common;

async fn echo_gateway() -> (common::Gateway, std::net::SocketAddr) {
    let upstream = common::spawn_upstream(demo::router(DemoState::default())).await;
    (common::spawn_gateway(upstream).await, upstream)
}

#[tokio::test]
async fn path_and_query_are_forwarded_verbatim() {
    let (gateway, _) = echo_gateway().await;

    let echo: Echo = common::client()
        .get(gateway.url("/api/echo/devices//scan?b=2&a=1&a=%20x"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(echo.method, "GET");
    assert_eq!(echo.uri, "/api/echo/devices//scan?b=2&a=1&a=%20x");
}

#[tokio::test]
async fn host_is_replaced_and_custom_headers_survive() {
    let (gateway, upstream) = echo_gateway().await;

    let echo: Echo = common::client()
        .get(gateway.url("/api/echo"))
        .header("x-session-id", "sess-123")
        .header("x-multi", "a")
        .header("x-multi", "b")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(echo.headers["x-session-id"], vec!["sess-123".to_string()]);
    assert_eq!(echo.headers["x-multi"], vec!["a, b".to_string()]);
    assert_eq!(echo.headers["host"], vec![upstream.to_string()]);
    assert_ne!(echo.headers["host"], vec![gateway.addr.to_string()]);
}

#[tokio::test]
async fn json_post_is_reserialized() {
    let (gateway, _) = echo_gateway().await;

    let echo: Echo = common::client()
        .post(gateway.url("/api/echo"))
        .header(header::CONTENT_TYPE, "application/json")
        .body("{ \"message\" :  \"hello\",\n \"n\": 1 }")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(echo.content_type.as_deref(), Some("application/json"));
    let sent: serde_json::Value = serde_json::from_str(&echo.body).unwrap();
    assert_eq!(sent, json!({ "message": "hello", "n": 1 }));
    assert_eq!(echo.body, serde_json::to_string(&sent).unwrap());
    assert_eq!(echo.body_len, echo.body.len());
}

#[tokio::test]
async fn json_key_order_survives_both_legs() {
    let upstream = common::spawn_upstream(
        demo::router(DemoState::default()).route(
            "/api/ordered",
            get(|| async {
                (
                    [(header::CONTENT_TYPE, "application/json")],
                    "{ \"zeta\": 1, \"alpha\": 2, \"mid\": { \"z\": true, \"a\": false } }",
                )
            }),
        ),
    )
    .await;
    let gateway = common::spawn_gateway(upstream).await;
    let client = common::client();

    let echo: Echo = client
        .post(gateway.url("/api/echo"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(r#"{"zeta":1, "alpha":2, "mid":{"z":true, "a":false}}"#)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(echo.body, r#"{"zeta":1,"alpha":2,"mid":{"z":true,"a":false}}"#);

    let relayed = client
        .get(gateway.url("/api/ordered"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert_eq!(relayed, r#"{"zeta":1,"alpha":2,"mid":{"z":true,"a":false}}"#);
}

#[tokio::test]
async fn multipart_is_forwarded_byte_for_byte() {
    // Upstream returns exactly the bytes it received.
    let upstream = common::spawn_upstream(Router::new().route(
        "/api/chat/image",
        post(|headers: HeaderMap, body: Bytes| async move {
            let content_type = headers[header::CONTENT_TYPE].clone();
            (
                [
                    (header::CONTENT_TYPE, "application/octet-stream".parse().unwrap()),
                    (header::HeaderName::from_static("x-received-type"), content_type),
                ],
                body,
            )
        }),
    ))
    .await;
    let gateway = common::spawn_gateway(upstream).await;

    let mut raw = Vec::new();
    raw.extend_from_slice(b"--XyZ\r\nContent-Disposition: form-data; name=\"meta\"\r\n\r\n");
    raw.extend_from_slice(b"{ \"spaced\" : true }\r\n");
    raw.extend_from_slice(b"--XyZ\r\nContent-Disposition: form-data; name=\"image\"; filename=\"a.jpg\"\r\n");
    raw.extend_from_slice(b"Content-Type: image/jpeg\r\n\r\n");
    raw.extend_from_slice(&[0xff, 0xd8, 0x00, 0x01, 0xfe, 0xff]);
    raw.extend_from_slice(b"\r\n--XyZ--\r\n");

    let response = common::client()
        .post(gateway.url("/api/chat/image"))
        .header(header::CONTENT_TYPE, "multipart/form-data; boundary=XyZ")
        .body(raw.clone())
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["x-received-type"],
        "multipart/form-data; boundary=XyZ"
    );
    let body = response.bytes().await.unwrap();
    assert_eq!(body.len(), raw.len());
    assert_eq!(&body[..], &raw[..]);
}

#[tokio::test]
async fn status_headers_and_json_body_are_relayed() {
    let upstream = common::spawn_upstream(Router::new().route(
        "/api/devices",
        post(|| async {
            (
                StatusCode::CREATED,
                [("x-upstream-trace", "t-42")],
                Json(json!({ "ok": true })),
            )
        }),
    ))
    .await;
    let gateway = common::spawn_gateway(upstream).await;

    let response = common::client()
        .post(gateway.url("/api/devices"))
        .json(&json!({ "name": "jetson" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(response.headers()["x-upstream-trace"], "t-42");
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
    assert_eq!(response.text().await.unwrap(), r#"{"ok":true}"#);
}

#[tokio::test]
async fn text_responses_are_relayed_verbatim() {
    let upstream = common::spawn_upstream(Router::new().route(
        "/api/readme",
        get(|| async { (StatusCode::NOT_FOUND, "  plain\ntext  ") }),
    ))
    .await;
    let gateway = common::spawn_gateway(upstream).await;

    let response = common::client()
        .get(gateway.url("/api/readme"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(response.headers()[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("text/plain"));
    assert_eq!(response.text().await.unwrap(), "  plain\ntext  ");
}

#[tokio::test]
async fn mislabeled_json_is_relayed_raw() {
    let upstream = common::spawn_upstream(Router::new().route(
        "/api/broken",
        any(|| async {
            (
                StatusCode::ACCEPTED,
                [(header::CONTENT_TYPE, "application/json")],
                "{not json",
            )
                .into_response()
        }),
    ))
    .await;
    let gateway = common::spawn_gateway(upstream).await;

    let response = common::client()
        .get(gateway.url("/api/broken"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    assert_eq!(response.text().await.unwrap(), "{not json");
}

#[tokio::test]
async fn concurrent_requests_complete_in_any_order() {
    let upstream = common::spawn_upstream(
        Router::new()
            .route(
                "/api/slow",
                get(|| async {
                    tokio::time::sleep(Duration::from_millis(300)).await;
                    Json(json!({ "path": "slow" }))
                }),
            )
            .route("/api/fast", get(|| async { Json(json!({ "path": "fast" })) })),
    )
    .await;
    let gateway = common::spawn_gateway(upstream).await;
    let client = common::client();

    let slow = async {
        let body: serde_json::Value = client
            .get(gateway.url("/api/slow"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        (body, std::time::Instant::now())
    };
    let fast = async {
        let body: serde_json::Value = client
            .get(gateway.url("/api/fast"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        (body, std::time::Instant::now())
    };

    let ((slow_body, slow_done), (fast_body, fast_done)) = tokio::join!(slow, fast);
    assert_eq!(slow_body, json!({ "path": "slow" }));
    assert_eq!(fast_body, json!({ "path": "fast" }));
    assert!(fast_done < slow_done);
}

#[tokio::test]
async fn paths_outside_the_prefix_are_not_forwarded() {
    let (gateway, _) = echo_gateway().await;

    let response = common::client()
        .get(gateway.url("/apis/echo"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        response.json::<serde_json::Value>().await.unwrap(),
        json!({ "message": "Not Found" })
    );
}
