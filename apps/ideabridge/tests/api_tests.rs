//! Integration tests for the ideabridge HTTP API.
//!
//! Uses axum-test to exercise the handlers without binding a port.

// Holding the env MutexGuard across await is intentional: auth tests mutate
// process-wide variables and must run one at a time.
#![allow(clippy::unwrap_used, clippy::panic, clippy::await_holding_lock)]

use axum::http::{HeaderValue, StatusCode};
use axum_test::TestServer;
use ideabridge::api::{
    AppState, CoerceResponse, ErrorResponse, HealthResponse, LinkWriteResponse,
    MaterializeResponse, PathResponse, ResetResponse, StatusResponse, api_error, create_router,
};
use ideabridge_core::{
    BridgeError, FieldKind, FieldSpec, Identifier, RecordDescriptor, RecordRegistry, Session,
};
use serde_json::{Value, json};
use std::sync::Mutex;

/// Serializes tests that read or modify `IDEABRIDGE_API_KEY`.
static ENV_TEST_MUTEX: Mutex<()> = Mutex::new(());

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

/// Holds the env mutex and clears the API key on drop.
struct TestGuard {
    _guard: std::sync::MutexGuard<'static, ()>,
}

impl Drop for TestGuard {
    fn drop(&mut self) {
        // SAFETY: Tests run sequentially under ENV_TEST_MUTEX, so no concurrent env access.
        unsafe { std::env::remove_var("IDEABRIDGE_API_KEY") };
    }
}

fn lock_env() -> TestGuard {
    let guard = ENV_TEST_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    // SAFETY: Tests run sequentially under ENV_TEST_MUTEX, so no concurrent env access.
    unsafe { std::env::remove_var("IDEABRIDGE_API_KEY") };
    TestGuard { _guard: guard }
}

fn server_for(session: Session) -> TestServer {
    TestServer::new(create_router(AppState::new(session))).unwrap()
}

/// A server over a fresh session with no record types.
fn create_test_server() -> (TestServer, TestGuard) {
    let guard = lock_env();
    (server_for(Session::new()), guard)
}

/// A server whose registry knows `bindings.soar.SoarCommandChange`.
fn create_records_test_server() -> (TestServer, TestGuard) {
    let guard = lock_env();
    let mut registry = RecordRegistry::new();
    registry.register_descriptor(RecordDescriptor::new(
        "bindings.soar.SoarCommandChange",
        vec![
            FieldSpec::new("productionName", FieldKind::Text),
            FieldSpec::new("quantity", FieldKind::Double),
            FieldSpec::new("apply", FieldKind::Text),
        ],
    ));
    let session = Session::new().with_registry(registry, "bindings.soar");
    (server_for(session), guard)
}

fn traffic_state() -> Value {
    json!({"InputLink": {
        "CURRENT_PHASE": {"phase": "NS_G_EW_R", "time": 12},
        "light": [{"color": "red", "number": 4}, {"color": "green", "number": 1}]
    }})
}

// =============================================================================
// HEALTH / STATUS TESTS
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let (server, _guard) = create_test_server();

    let response = server.get("/health").await;

    response.assert_status_ok();
    let health: HealthResponse = response.json();
    assert_eq!(health.status, "ok");
    assert_eq!(health.version, env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_status_fresh_session() {
    let (server, _guard) = create_test_server();

    let response = server.get("/status").await;

    response.assert_status_ok();
    let status: StatusResponse = response.json();
    assert_eq!(status.generation, 0);
    assert_eq!(status.input_link_edges, 0);
    assert_eq!(status.output_link_edges, 0);
    assert_eq!(status.total_edges, 3);
    assert_eq!(status.record_types, 0);
}

// =============================================================================
// INPUT LINK TESTS
// =============================================================================

#[tokio::test]
async fn test_input_link_round_trip() {
    let (server, _guard) = create_test_server();

    let response = server.post("/input-link").json(&traffic_state()).await;
    response.assert_status_ok();
    let write: LinkWriteResponse = response.json();
    assert!(write.success);
    // CURRENT_PHASE + 2 leaves, two light vertices + 2 leaves each
    assert_eq!(write.written, 9);

    let response = server.get("/input-link").await;
    response.assert_status_ok();
    let doc: Value = response.json();
    assert_eq!(
        doc.pointer("/InputLink/CURRENT_PHASE/phase"),
        Some(&json!("NS_G_EW_R"))
    );
    let lights = doc
        .pointer("/InputLink/light")
        .and_then(Value::as_array)
        .unwrap();
    assert_eq!(lights.len(), 2);
    assert!(lights.contains(&json!({"color": "red", "number": 4.0})));
}

#[tokio::test]
async fn test_input_link_is_replaced() {
    let (server, _guard) = create_test_server();

    server.post("/input-link").json(&traffic_state()).await;
    server
        .post("/input-link")
        .json(&json!({"InputLink": {"A": "x"}}))
        .await
        .assert_status_ok();

    let status: StatusResponse = server.get("/status").await.json();
    assert_eq!(status.input_link_edges, 1);
    assert_eq!(status.total_edges, 4);
}

#[tokio::test]
async fn test_rejected_input_link_keeps_content() {
    let (server, _guard) = create_test_server();

    server
        .post("/input-link")
        .json(&json!({"InputLink": {"OLD": 1}}))
        .await
        .assert_status_ok();
    server
        .post("/input-link")
        .json(&json!({"InputLink": {"A": 1, "": 2}}))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    let doc: Value = server.get("/input-link").await.json();
    assert_eq!(doc, json!({"InputLink": {"OLD": 1.0}}));
}

#[tokio::test]
async fn test_wmes_dump() {
    let (server, _guard) = create_test_server();
    server
        .post("/input-link")
        .json(&json!({"InputLink": {"A": "x"}}))
        .await;

    let response = server.get("/wmes/input").await;
    response.assert_status_ok();
    assert_eq!(response.text(), "(I2,A,x)\n");

    let response = server.get("/wmes/output").await;
    response.assert_status_ok();
    assert_eq!(response.text(), "");
}

#[tokio::test]
async fn test_wmes_unknown_link_is_bad_request() {
    let (server, _guard) = create_test_server();

    let response = server.get("/wmes/sideways").await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let error: ErrorResponse = response.json();
    assert!(error.error.contains("sideways"));
}

// =============================================================================
// OUTPUT LINK / MATERIALIZE TESTS
// =============================================================================

#[tokio::test]
async fn test_output_link_materializes() {
    let (server, _guard) = create_records_test_server();

    server
        .post("/output-link")
        .json(&json!({"OutputLink": {
            "SoarCommandChange": {"productionName": "change", "quantity": 2, "apply": "true"},
            "SoarCommandARRAY": {"quantity": 1}
        }}))
        .await
        .assert_status_ok();

    let response = server.post("/materialize").await;
    response.assert_status_ok();
    let materialized: MaterializeResponse = response.json();
    assert_eq!(materialized.count, 1);
    assert_eq!(
        materialized.records[0],
        json!({"bindings.soar.SoarCommandChange": {
            "productionName": "change",
            "quantity": "2.0",
            "apply": "true"
        }})
    );
}

#[tokio::test]
async fn test_output_link_bare_command() {
    let (server, _guard) = create_records_test_server();

    server
        .post("/output-link")
        .json(&json!({"SoarCommandChange": {"productionName": "change"}}))
        .await
        .assert_status_ok();

    let doc: Value = server.get("/output-link").await.json();
    assert_eq!(
        doc,
        json!({"OutputLink": {"SoarCommandChange": {"productionName": "change"}}})
    );
}

#[tokio::test]
async fn test_materialize_without_registry_is_empty() {
    let (server, _guard) = create_test_server();
    server
        .post("/output-link")
        .json(&json!({"OutputLink": {"Turn": {"angle": 3}}}))
        .await;

    let materialized: MaterializeResponse = server.post("/materialize").await.json();
    assert_eq!(materialized.count, 0);
    assert!(materialized.records.is_empty());
}

// =============================================================================
// RESET TESTS
// =============================================================================

#[tokio::test]
async fn test_reset_bumps_generation_and_clears_links() {
    let (server, _guard) = create_test_server();
    server.post("/input-link").json(&traffic_state()).await;

    let response = server.post("/reset").await;
    response.assert_status_ok();
    let reset: ResetResponse = response.json();
    assert!(reset.success);
    assert_eq!(reset.generation, 1);

    let status: StatusResponse = server.get("/status").await.json();
    assert_eq!(status.generation, 1);
    assert_eq!(status.input_link_edges, 0);
}

// =============================================================================
// PATH / COERCE TESTS
// =============================================================================

#[tokio::test]
async fn test_path_build() {
    let (server, _guard) = create_test_server();

    let response = server
        .post("/path/build")
        .json(&json!({"path": "A.B.C", "value": 4}))
        .await;

    response.assert_status_ok();
    let built: PathResponse = response.json();
    assert_eq!(built.document, json!({"A": {"B": {"C": 4}}}));
}

#[tokio::test]
async fn test_path_graft_keeps_siblings() {
    let (server, _guard) = create_test_server();

    let response = server
        .post("/path/graft")
        .json(&json!({"document": {"D": 1, "A": {"E": 2}}, "path": "A.B.C", "value": 4}))
        .await;

    response.assert_status_ok();
    let grafted: PathResponse = response.json();
    assert_eq!(
        grafted.document,
        json!({"D": 1, "A": {"E": 2, "B": {"C": 4}}})
    );
}

#[tokio::test]
async fn test_path_empty_segment_is_bad_request() {
    let (server, _guard) = create_test_server();

    let response = server
        .post("/path/build")
        .json(&json!({"path": "A..C", "value": 4}))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_coerce() {
    let (server, _guard) = create_test_server();

    let coerced: CoerceResponse = server
        .post("/coerce")
        .json(&json!({"value": "2", "kind": "long"}))
        .await
        .json();
    assert_eq!(coerced.value, Some(json!(2)));

    let coerced: CoerceResponse = server
        .post("/coerce")
        .json(&json!({"value": 2, "kind": "double"}))
        .await
        .json();
    assert_eq!(coerced.value, Some(json!(2.0)));

    let coerced: CoerceResponse = server
        .post("/coerce")
        .json(&json!({"value": "SSSSSSSSSSSS", "kind": "int"}))
        .await
        .json();
    assert_eq!(coerced.value, None);
}

#[tokio::test]
async fn test_coerce_unknown_kind_is_bad_request() {
    let (server, _guard) = create_test_server();

    let response = server
        .post("/coerce")
        .json(&json!({"value": "2", "kind": "decimal"}))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

// =============================================================================
// ERROR HANDLING TESTS
// =============================================================================

#[test]
fn test_error_status_mapping() {
    let (status, _) = api_error(BridgeError::MalformedInput("x".to_string()));
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = api_error(BridgeError::StaleIdentifier(Identifier::new('I', 4, 4, 0)));
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = api_error(BridgeError::IoError("disk".to_string()));
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.0.error.contains("disk"));
}

#[tokio::test]
async fn test_404_on_unknown_endpoint() {
    let (server, _guard) = create_test_server();

    let response = server.get("/unknown").await;
    response.assert_status_not_found();
}

#[tokio::test]
async fn test_method_not_allowed() {
    let (server, _guard) = create_test_server();

    let response = server.post("/health").await;
    assert_eq!(response.status_code().as_u16(), 405);
}

#[tokio::test]
async fn test_invalid_json_body() {
    let (server, _guard) = create_test_server();

    let response = server
        .post("/input-link")
        .text("not valid json")
        .content_type("application/json")
        .await;

    assert!(response.status_code().is_client_error());
}

// =============================================================================
// AUTHENTICATION MIDDLEWARE TESTS
// =============================================================================

/// A server with authentication enabled. The returned guard clears the key.
fn create_auth_test_server(api_key: &str) -> (TestServer, TestGuard) {
    let guard = lock_env();
    // SAFETY: Tests run sequentially under ENV_TEST_MUTEX, so no concurrent env access.
    unsafe { std::env::set_var("IDEABRIDGE_API_KEY", api_key) };
    (server_for(Session::new()), guard)
}

#[tokio::test]
async fn test_auth_valid_bearer_token() {
    let api_key = "test-secret-key-12345";
    let (server, _guard) = create_auth_test_server(api_key);

    let response = server
        .get("/status")
        .add_header(
            axum::http::header::AUTHORIZATION,
            format!("Bearer {}", api_key)
                .parse::<HeaderValue>()
                .unwrap(),
        )
        .await;

    response.assert_status_ok();
}

#[tokio::test]
async fn test_auth_valid_raw_token() {
    let api_key = "test-raw-key-67890";
    let (server, _guard) = create_auth_test_server(api_key);

    let response = server
        .get("/status")
        .add_header(
            axum::http::header::AUTHORIZATION,
            api_key.parse::<HeaderValue>().unwrap(),
        )
        .await;

    response.assert_status_ok();
}

#[tokio::test]
async fn test_auth_invalid_token_rejected() {
    let (server, _guard) = create_auth_test_server("correct-key");

    let response = server
        .post("/input-link")
        .add_header(
            axum::http::header::AUTHORIZATION,
            "Bearer wrong-key".parse::<HeaderValue>().unwrap(),
        )
        .json(&json!({"InputLink": {"A": 1}}))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_auth_missing_header_rejected() {
    let (server, _guard) = create_auth_test_server("required-key");

    let response = server.get("/status").await;

    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_auth_bearer_prefix_only_rejected() {
    let (server, _guard) = create_auth_test_server("actual-key");

    let response = server
        .get("/status")
        .add_header(
            axum::http::header::AUTHORIZATION,
            "Bearer ".parse::<HeaderValue>().unwrap(),
        )
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_auth_health_endpoint_bypasses_auth() {
    let (server, _guard) = create_auth_test_server("secret-key-for-bypass-test");

    let response = server.get("/health").await;

    response.assert_status_ok();
}
