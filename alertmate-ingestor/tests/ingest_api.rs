//! End-to-end tests for the ingestor, including relaying from the core
//! forwarder over real HTTP.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use alertmate_core::forward::JSON_CONTENT_TYPE;
use alertmate_core::{HttpTransport, Pipeline, RawEvent, SettingsStore};
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use alertmate_ingestor::{router, AppState};
use serde_json::{json, Value};

/// Start the ingestor on an ephemeral port
async fn spawn_ingestor() -> (SocketAddr, AppState) {
    let state = AppState::new();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind");
    let addr = listener.local_addr().expect("no local addr");

    let app = router(state.clone());
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("server failed");
    });

    (addr, state)
}

// ============================================
// HTTP API
// ============================================

#[tokio::test]
async fn test_health() {
    let (addr, _) = spawn_ingestor().await;

    let response = reqwest::get(format!("http://{}/health", addr)).await.unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({ "status": "ok" }));
}

#[tokio::test]
async fn test_ingest_accepts_valid_notification() {
    let (addr, state) = spawn_ingestor().await;

    let response = reqwest::Client::new()
        .post(format!("http://{}/ingest", addr))
        .json(&json!({
            "id": "k1",
            "deviceId": "dev",
            "source": "app.a",
            "type": "notification",
            "timestamp": 1_700_000_000_000i64,
            "payload": { "title": "t", "message": "m" }
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 202);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({ "status": "accepted", "id": "k1" }));
    assert_eq!(state.accepted(), 1);
}

#[tokio::test]
async fn test_ingest_ignores_content_type() {
    let (addr, state) = spawn_ingestor().await;

    let response = reqwest::Client::new()
        .post(format!("http://{}/ingest", addr))
        .header("content-type", "text/plain")
        .body(r#"{"id":"plain"}"#)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 202);
    assert_eq!(state.accepted(), 1);
}

#[tokio::test]
async fn test_ingest_rejects_invalid_notification() {
    let (addr, state) = spawn_ingestor().await;

    let response = reqwest::Client::new()
        .post(format!("http://{}/ingest", addr))
        .json(&json!({ "source": "app.a", "payload": [] }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 422);
    let body: Value = response.json().await.unwrap();
    let detail = body["detail"].as_array().unwrap();
    assert_eq!(detail.len(), 2);
    assert_eq!(detail[0]["loc"], json!(["id"]));
    assert_eq!(state.accepted(), 0);
    assert_eq!(state.rejected(), 1);
}

#[tokio::test]
async fn test_ingest_rejects_malformed_json() {
    let (addr, state) = spawn_ingestor().await;

    let response = reqwest::Client::new()
        .post(format!("http://{}/ingest", addr))
        .body("{not json")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
    assert_eq!(state.rejected(), 1);
}

// ============================================
// Relay from the core pipeline
// ============================================

fn relay_pipeline(endpoint: &str) -> Pipeline {
    let transport = HttpTransport::with_timeout(Some(std::time::Duration::from_secs(10))).unwrap();
    Pipeline::with_transport(
        "com.example.alertmate",
        "test-device",
        SettingsStore::ephemeral(endpoint),
        Arc::new(transport),
    )
    .unwrap()
}

#[tokio::test]
async fn test_pipeline_relays_every_capture() {
    let (addr, state) = spawn_ingestor().await;
    let pipeline = relay_pipeline(&format!("http://{}/ingest", addr));
    let listener = pipeline.listener();

    for i in 0..3 {
        listener.on_event_posted(
            RawEvent::new("app.a", format!("a{}", i), 1_700_000_000_000).with_title("hello"),
        );
    }
    listener.on_event_posted(RawEvent::new("app.b", "b0", 1_700_000_000_500));
    listener.on_event_posted(RawEvent::new("com.example.alertmate", "own", 0));

    pipeline.forwarder().drain().await;

    let snapshot = pipeline.aggregation().snapshot();
    assert_eq!(snapshot.len(), 2);
    assert_eq!(snapshot["app.a"], 3);
    assert_eq!(snapshot["app.b"], 1);

    assert_eq!(state.accepted(), 4);
    let stats = pipeline.forwarder().stats();
    assert_eq!(stats.attempted, 4);
    assert_eq!(stats.delivered, 4);
}

#[tokio::test]
async fn test_pipeline_counts_when_endpoint_rejects() {
    let (addr, state) = spawn_ingestor().await;
    // wrong path answers 404
    let pipeline = relay_pipeline(&format!("http://{}/missing", addr));

    pipeline
        .listener()
        .on_event_posted(RawEvent::new("app.a", "k", 1));
    pipeline.forwarder().drain().await;

    assert_eq!(pipeline.aggregation().count("app.a"), 1);
    assert_eq!(pipeline.forwarder().stats().failed, 1);
    assert_eq!(state.accepted(), 0);
}

type SeenContentTypes = Arc<Mutex<Vec<Option<String>>>>;

/// Endpoint that only records the Content-Type of each POST
async fn spawn_header_recorder() -> (SocketAddr, SeenContentTypes) {
    async fn record(State(seen): State<SeenContentTypes>, headers: HeaderMap) -> StatusCode {
        let content_type = headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        seen.lock().unwrap().push(content_type);
        StatusCode::ACCEPTED
    }

    let seen = SeenContentTypes::default();
    let app = axum::Router::new()
        .route("/ingest", axum::routing::post(record))
        .with_state(Arc::clone(&seen));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind");
    let addr = listener.local_addr().expect("no local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("server failed");
    });

    (addr, seen)
}

#[tokio::test]
async fn test_forwarded_events_declare_utf8_json() {
    let (addr, seen) = spawn_header_recorder().await;
    let pipeline = relay_pipeline(&format!("http://{}/ingest", addr));

    pipeline
        .listener()
        .on_event_posted(RawEvent::new("app.a", "k1", 1).with_text("héllo"));
    pipeline
        .listener()
        .on_event_posted(RawEvent::new("app.b", "k2", 2));
    pipeline.forwarder().drain().await;

    assert_eq!(pipeline.forwarder().stats().delivered, 2);
    let seen = seen.lock().unwrap().clone();
    assert_eq!(
        seen,
        vec![
            Some("application/json; charset=utf-8".to_string()),
            Some(JSON_CONTENT_TYPE.to_string()),
        ]
    );
}
