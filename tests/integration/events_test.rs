//! Integration tests for event dispatch.

use axum::http::StatusCode;

use crate::helpers::TestApp;

#[tokio::test]
async fn test_hello_world_logs_greeting() {
    let app = TestApp::new().await;

    let responses = app.dispatch(serde_json::json!({"type": "UNKNOWN"})).await;

    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0]["success"], true);
    assert_eq!(
        responses[0]["handler"],
        "example_plugin:example_plugin.protocols.my_protocol:Protocol"
    );
    assert_eq!(
        responses[0]["effects"],
        serde_json::json!([{"type": "LOG", "payload": "Hello, world!"}])
    );
}

#[tokio::test]
async fn test_patient_created_adds_banner() {
    let app = TestApp::new().await;

    let responses = app
        .dispatch(serde_json::json!({
            "type": "PATIENT_CREATED",
            "target": "p-7",
            "target_type": "Patient",
            "context": {"first_name": "Grace"},
        }))
        .await;

    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0]["success"], true);
    let effect = &responses[0]["effects"][0];
    assert_eq!(effect["type"], "ADD_BANNER_ALERT");

    let payload: serde_json::Value =
        serde_json::from_str(effect["payload"].as_str().unwrap()).unwrap();
    assert_eq!(payload["data"]["patient_id"], "p-7");
    assert_eq!(payload["data"]["narrative"], "Welcome: Grace");
}

#[tokio::test]
async fn test_handler_error_is_reported_not_raised() {
    let app = TestApp::new().await;

    let responses = app
        .dispatch(serde_json::json!({"type": "PATIENT_CREATED"}))
        .await;

    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0]["success"], false);
    assert_eq!(responses[0]["effects"], serde_json::json!([]));
    assert!(responses[0]["error"].is_string());
}

#[tokio::test]
async fn test_event_without_handlers() {
    let app = TestApp::new().await;

    let responses = app
        .dispatch(serde_json::json!({"type": "NOTE_CREATED"}))
        .await;

    assert!(responses.is_empty());
}

#[tokio::test]
async fn test_blank_event_type_rejected() {
    let app = TestApp::new().await;

    let response = app
        .request("POST", "/api/events", Some(serde_json::json!({"type": " "})))
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "VALIDATION_ERROR");
}
