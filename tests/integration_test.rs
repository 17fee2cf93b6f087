use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;
use tower::ServiceExt;

use wshub::app::router;
use wshub::connection::ChannelConnection;
use wshub::state::AppState;

async fn connect(state: &AppState, id: &str) -> UnboundedReceiver<String> {
    let (conn, rx) = ChannelConnection::new(id);
    state.registry.add(Arc::new(conn)).await.unwrap();
    rx
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Echo goes to the sender only, broadcast goes to everyone verbatim
#[tokio::test]
async fn test_echo_then_broadcast() {
    let state = AppState::default();
    let mut c1 = connect(&state, "c1").await;
    let mut c2 = connect(&state, "c2").await;
    let mut c3 = connect(&state, "c3").await;

    state
        .dispatcher
        .handle("c1", r#"{"type":"echo","content":"hi"}"#)
        .await;

    let reply: Value = serde_json::from_str(&c1.recv().await.unwrap()).unwrap();
    assert_eq!(reply["type"], "echo_response");
    assert_eq!(
        reply["original_message"],
        json!({"type": "echo", "content": "hi"})
    );
    assert!(reply["timestamp"].is_string());
    assert!(c2.try_recv().is_err());
    assert!(c3.try_recv().is_err());

    let report = state.broadcaster.broadcast_all("SYS:update").await;
    assert_eq!(report.attempted, 3);
    assert_eq!(report.succeeded, 3);

    assert_eq!(c1.recv().await.as_deref(), Some("SYS:update"));
    assert_eq!(c2.recv().await.as_deref(), Some("SYS:update"));
    assert_eq!(c3.recv().await.as_deref(), Some("SYS:update"));
}

#[tokio::test]
async fn test_plain_text_reply() {
    let state = AppState::default();
    let mut rx = connect(&state, "c1").await;

    state.dispatcher.handle("c1", "hello").await;

    let reply: Value = serde_json::from_str(&rx.recv().await.unwrap()).unwrap();
    assert_eq!(reply["status"], "received");
    assert_eq!(reply["message_length"], 5);
}

#[tokio::test]
async fn test_replies_keep_message_order() {
    let state = AppState::default();
    let mut rx = connect(&state, "c1").await;

    for msg in [r#"{"type":"ping"}"#, "text", "[1]"] {
        state.dispatcher.handle("c1", msg).await;
    }

    let first: Value = serde_json::from_str(&rx.recv().await.unwrap()).unwrap();
    let second: Value = serde_json::from_str(&rx.recv().await.unwrap()).unwrap();
    let third: Value = serde_json::from_str(&rx.recv().await.unwrap()).unwrap();
    assert_eq!(first["type"], "pong");
    assert_eq!(second["message_length"], 4);
    assert_eq!(third["data_type"], "array");
}

#[tokio::test]
async fn test_broadcast_survives_dead_peer() {
    let state = AppState::default();
    let mut a = connect(&state, "A").await;
    let b = connect(&state, "B").await;
    let mut c = connect(&state, "C").await;
    drop(b);

    let report = state.broadcaster.broadcast_all("ping all").await;

    assert_eq!(report.succeeded, 2);
    assert_eq!(report.failed_ids, vec!["B".to_string()]);
    assert_eq!(a.recv().await.as_deref(), Some("ping all"));
    assert_eq!(c.recv().await.as_deref(), Some("ping all"));
    assert_eq!(state.registry.count().await, 2);
}

#[tokio::test]
async fn test_broadcast_during_churn() {
    let state = Arc::new(AppState::default());
    let mut receivers = Vec::new();
    for i in 0..20 {
        receivers.push(connect(&state, &format!("c{}", i)).await);
    }

    // Disconnect half the clients while broadcasts are in flight
    let churn = {
        let state = state.clone();
        tokio::spawn(async move {
            for i in (0..20).step_by(2) {
                state.registry.remove(&format!("c{}", i)).await;
                tokio::task::yield_now().await;
            }
        })
    };
    let mut reports = Vec::new();
    for _ in 0..5 {
        reports.push(state.broadcaster.broadcast_all("tick").await);
    }
    churn.await.unwrap();

    for report in &reports {
        assert_eq!(report.attempted, report.succeeded + report.failed());
    }
    assert_eq!(state.registry.count().await, 10);
    // Odd clients stayed connected the whole time and got every tick
    for (i, rx) in receivers.iter_mut().enumerate() {
        if i % 2 == 1 {
            for _ in 0..5 {
                assert_eq!(rx.recv().await.as_deref(), Some("tick"));
            }
        }
    }
}

#[tokio::test]
async fn test_api_status() {
    let state = Arc::new(AppState::default());
    let addr: SocketAddr = "192.168.1.20:40000".parse().unwrap();
    let (conn, _rx) = ChannelConnection::new(addr.to_string());
    state
        .registry
        .add(Arc::new(conn.with_remote_addr(addr)))
        .await
        .unwrap();

    let response = router(state)
        .oneshot(
            Request::builder()
                .uri("/api/ws/status")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "running");
    assert_eq!(body["active_connections"], 1);
    assert_eq!(
        body["clients"],
        json!([{"host": "192.168.1.20", "port": 40000, "address": "192.168.1.20:40000"}])
    );
}

#[tokio::test]
async fn test_api_broadcast() {
    let state = Arc::new(AppState::default());
    let mut c1 = connect(&state, "c1").await;
    let mut c2 = connect(&state, "c2").await;

    let response = router(state.clone())
        .oneshot(post_json(
            "/api/ws/broadcast",
            r#"{"type":"announcement","content":"hello"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "success");
    assert_eq!(body["recipient_count"], 2);
    assert_eq!(body["failed_count"], 0);

    // Forwarded byte for byte, keys in the order they were posted
    for rx in [&mut c1, &mut c2] {
        assert_eq!(
            rx.recv().await.as_deref(),
            Some(r#"{"type":"announcement","content":"hello"}"#)
        );
    }
}

#[tokio::test]
async fn test_api_broadcast_with_no_clients() {
    let state = Arc::new(AppState::default());

    let response = router(state)
        .oneshot(post_json("/api/ws/broadcast", r#"{"type":"x"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["recipient_count"], 0);
}

#[tokio::test]
async fn test_api_broadcast_rejects_non_object() {
    let state = Arc::new(AppState::default());

    let response = router(state)
        .oneshot(post_json("/api/ws/broadcast", "[1,2,3]"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["status"], "error");
}

#[tokio::test]
async fn test_api_send_to_one_client() {
    let state = Arc::new(AppState::default());
    let mut target = connect(&state, "10.0.0.1:5000").await;
    let mut other = connect(&state, "10.0.0.2:5000").await;

    let response = router(state)
        .oneshot(post_json("/api/ws/send/10.0.0.1:5000", r#"{"type":"direct"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "success");
    assert_eq!(body["recipient"], "10.0.0.1:5000");
    assert_eq!(target.recv().await.as_deref(), Some(r#"{"type":"direct"}"#));
    // Never falls back to broadcast
    assert!(other.try_recv().is_err());
}

#[tokio::test]
async fn test_api_send_to_unknown_client() {
    let state = Arc::new(AppState::default());
    let mut other = connect(&state, "10.0.0.2:5000").await;

    let response = router(state)
        .oneshot(post_json("/api/ws/send/10.0.0.9:1", r#"{"type":"direct"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["status"], "error");
    assert!(other.try_recv().is_err());
}

#[tokio::test]
async fn test_api_send_to_dead_client_evicts() {
    let state = Arc::new(AppState::default());
    let rx = connect(&state, "10.0.0.3:5000").await;
    drop(rx);

    let response = router(state.clone())
        .oneshot(post_json("/api/ws/send/10.0.0.3:5000", r#"{"type":"direct"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::GONE);
    assert_eq!(state.registry.count().await, 0);
}
