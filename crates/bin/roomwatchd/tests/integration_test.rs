//! End-to-end smoke tests for the full roomwatchd stack.
//!
//! Each test wires the real services, the relay transport against a mock
//! relay, the JSON-lines log in a temporary directory and the real axum
//! router, then exercises the HTTP layer via `tower::ServiceExt::oneshot`.
//! No TCP port is bound for the API itself.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use roomwatch_adapter_http_axum::router;
use roomwatch_adapter_http_axum::state::{AppState, HttpSettings};
use roomwatch_adapter_relay::{RelayConfig, RelayTransport};
use roomwatch_adapter_storage_jsonl::{JsonLinesLog, JsonlConfig};
use roomwatch_app::event_bus::EventBus;
use roomwatch_app::link::{LinkDriver, LinkSettings};
use roomwatch_app::services::ingest_coordinator::{IngestCoordinator, IngestSettings};
use roomwatch_app::state_store::StateStore;
use roomwatch_domain::user::{Directory, User};

struct Stack {
    app: axum::Router,
    ingest: Arc<IngestCoordinator<RelayTransport, JsonLinesLog>>,
    relay: MockServer,
    data_dir: TempDir,
}

/// Build a fully-wired router whose link goes through a mock relay.
async fn stack(connect: bool) -> Stack {
    let relay = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/command"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
        .mount(&relay)
        .await;

    let data_dir = tempfile::tempdir().expect("temporary directory should be created");

    let bus = EventBus::default();
    let store = Arc::new(StateStore::new(
        bus.clone(),
        Directory::new([User::new("alice", "Alice")]),
    ));
    let transport = RelayTransport::new(&RelayConfig {
        command_url: format!("{}/command", relay.uri()),
        timeout_secs: 2,
    })
    .expect("relay client should build");
    let link = Arc::new(LinkDriver::new(transport, LinkSettings::default()));
    if connect {
        link.connect().await.expect("mock relay should accept the handshake");
    }
    let log = Arc::new(JsonLinesLog::new(&JsonlConfig {
        dir: data_dir.path().to_path_buf(),
    }));
    let ingest = Arc::new(IngestCoordinator::new(
        Arc::clone(&link),
        Arc::clone(&store),
        log,
        IngestSettings::default(),
    ));

    let state = AppState::new(
        store,
        bus,
        link,
        Arc::clone(&ingest),
        HttpSettings::default(),
    );
    Stack {
        app: router::build(state),
        ingest,
        relay,
        data_dir,
    }
}

fn post(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn json_body(resp: axum::response::Response) -> Value {
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn wait_for_log_lines(dir: &Path, expected: usize) -> Vec<Value> {
    for _ in 0..100 {
        let mut lines = Vec::new();
        if let Ok(entries) = std::fs::read_dir(dir) {
            for entry in entries.flatten() {
                let content = std::fs::read_to_string(entry.path()).unwrap_or_default();
                lines.extend(
                    content
                        .lines()
                        .filter_map(|line| serde_json::from_str::<Value>(line).ok()),
                );
            }
        }
        if lines.len() >= expected {
            return lines;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("payload log never reached {expected} lines");
}

// ---------------------------------------------------------------------------
// Health check
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_return_ok_when_health_check_called() {
    let stack = stack(false).await;

    let resp = stack.app.oneshot(get("/health")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
}

// ---------------------------------------------------------------------------
// Relay push
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_apply_pushed_payload_and_persist_it() {
    let stack = stack(false).await;

    let resp = stack
        .app
        .clone()
        .oneshot(post(
            "/api/data",
            &json!({"door": "open", "luminosity": 42, "source": "relay-1"}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let ack = json_body(resp).await;
    assert_eq!(ack["status"], "success");

    let resp = stack.app.clone().oneshot(get("/api/state")).await.unwrap();
    let state = json_body(resp).await;
    assert_eq!(state["door_open"], true);
    assert_eq!(state["luminosity"], 42.0);
    assert_eq!(state["occupied"], false);

    let lines = wait_for_log_lines(stack.data_dir.path(), 1).await;
    assert_eq!(lines[0]["ingress"], "push");
    assert_eq!(lines[0]["payload"]["door"], "open");
}

#[tokio::test]
async fn should_reject_non_object_push() {
    let stack = stack(false).await;

    let resp = stack
        .app
        .oneshot(post("/api/data", &json!(["door", "open"])))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(json_body(resp).await["error"].is_string());
}

#[tokio::test]
async fn should_replay_welcome_in_recent_messages() {
    let stack = stack(false).await;
    stack
        .app
        .clone()
        .oneshot(post("/api/data", &json!({"user_present": true})))
        .await
        .unwrap();

    let resp = stack.app.oneshot(get("/api/events/recent")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    let kinds: Vec<&str> = body["messages"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|event| event["kind"].as_str())
        .collect();
    assert_eq!(kinds, vec!["update", "welcome"]);
    assert_eq!(body["messages"][1]["payload"]["message"], "Welcome, Alice!");
}

#[tokio::test]
async fn should_count_pushes_in_stats() {
    let stack = stack(false).await;
    for _ in 0..2 {
        stack
            .app
            .clone()
            .oneshot(post("/api/data", &json!({"light": "on", "source": "relay-1"})))
            .await
            .unwrap();
    }

    let resp = stack.app.oneshot(get("/api/stats")).await.unwrap();

    let stats = json_body(resp).await;
    assert_eq!(stats["ingest"]["total_messages"], 2);
    assert_eq!(stats["ingest"]["by_source"]["relay-1"], 2);
}

// ---------------------------------------------------------------------------
// Control through the relay
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_forward_light_command_to_relay() {
    let stack = stack(true).await;
    Mock::given(method("POST"))
        .and(path("/command"))
        .and(body_partial_json(json!({"action": "light_on"})))
        .respond_with(ResponseTemplate::new(200))
        .with_priority(1)
        .expect(1)
        .mount(&stack.relay)
        .await;

    let resp = stack
        .app
        .clone()
        .oneshot(post("/api/light", &json!({"state": "on"})))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let resp = stack.app.oneshot(get("/api/state")).await.unwrap();
    assert_eq!(json_body(resp).await["light_on"], true);
    stack.relay.verify().await;
}

#[tokio::test]
async fn should_refuse_light_off_in_occupied_room() {
    let stack = stack(true).await;
    stack
        .app
        .clone()
        .oneshot(post("/api/data", &json!({"user_present": true, "light": "on"})))
        .await
        .unwrap();

    let resp = stack
        .app
        .clone()
        .oneshot(post("/api/light", &json!({"state": "off"})))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let resp = stack
        .app
        .clone()
        .oneshot(post(
            "/api/light",
            &json!({"state": "off", "manual_override": true}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = stack.app.oneshot(get("/api/state")).await.unwrap();
    let state = json_body(resp).await;
    assert_eq!(state["light_on"], false);
    assert_eq!(state["manual_override"], true);
}

#[tokio::test]
async fn should_answer_service_unavailable_without_link() {
    let stack = stack(false).await;

    let resp = stack
        .app
        .oneshot(post("/api/override", &json!({"enable": true})))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn should_not_treat_relay_acknowledgements_as_device_data() {
    let stack = stack(false).await;
    let ingest = Arc::clone(&stack.ingest);
    let link_loop = tokio::spawn(async move { ingest.run().await });

    tokio::time::sleep(Duration::from_millis(800)).await;
    link_loop.abort();

    let resp = stack.app.oneshot(get("/api/state")).await.unwrap();
    let state = json_body(resp).await;
    assert_eq!(state["link_connected"], true);
    assert!(state["last_update"].is_null());
    assert_eq!(state["arduino_connected"], false);
    assert_eq!(stack.ingest.stats().total_messages, 0);
}
