//! Integration tests for the registry listing and plugin reload.

use axum::http::StatusCode;

use crate::helpers::TestApp;

fn package<'a>(body: &'a serde_json::Value, name: &str) -> &'a serde_json::Value {
    body["data"]["packages"]
        .as_array()
        .unwrap()
        .iter()
        .find(|p| p["name"] == name)
        .unwrap_or_else(|| panic!("package {name} not listed"))
}

#[tokio::test]
async fn test_demo_plugins_are_active() {
    let app = TestApp::new().await;

    let response = app.request("GET", "/api/plugins", None).await;

    assert_eq!(response.status, StatusCode::OK);
    for name in ["appointment_followup", "example_plugin", "patient_banner"] {
        assert_eq!(package(&response.body, name)["state"], "active");
    }
    assert_eq!(
        response.body["data"]["event_handlers"]["UNKNOWN"],
        serde_json::json!(["example_plugin:example_plugin.protocols.my_protocol:Protocol"])
    );
}

#[tokio::test]
async fn test_forbidden_import_only_disables_that_plugin() {
    let app = TestApp::new().await;
    app.write_plugin_file(
        "evil/CANVAS_MANIFEST.json",
        r#"{"name": "evil", "components": {"protocols": [{"class": "evil.protocols.p:Protocol"}]}}"#,
    );
    app.write_plugin_file("evil/protocols/p.py", "import os\n");

    let reload = app.request("POST", "/api/plugins/reload", None).await;
    assert_eq!(reload.body["data"][0]["success"], true);

    let listing = app.request("GET", "/api/plugins", None).await;
    let evil = package(&listing.body, "evil");
    assert_eq!(evil["state"], "inactive");
    assert!(
        evil["error"]
            .as_str()
            .unwrap()
            .contains("'os' is not an allowed import.")
    );
    assert_eq!(package(&listing.body, "example_plugin")["state"], "active");

    let responses = app.dispatch(serde_json::json!({"type": "UNKNOWN"})).await;
    assert_eq!(responses.len(), 1);
}

#[tokio::test]
async fn test_reload_drops_removed_plugin() {
    let app = TestApp::new().await;
    app.remove_plugin("example_plugin");

    let reload = app.request("POST", "/api/plugins/reload", None).await;
    assert_eq!(reload.status, StatusCode::OK);
    assert_eq!(reload.body["data"], serde_json::json!([{"success": true}]));

    let responses = app.dispatch(serde_json::json!({"type": "UNKNOWN"})).await;
    assert!(responses.is_empty());
}

#[tokio::test]
async fn test_failed_reload_keeps_previous_registry() {
    let app = TestApp::new().await;
    std::fs::remove_dir_all(&app.plugins_dir).unwrap();

    let reload = app.request("POST", "/api/plugins/reload", None).await;
    assert_eq!(reload.status, StatusCode::OK);
    assert_eq!(reload.body["data"][0]["success"], false);
    assert!(reload.body["data"][0]["error"].is_string());

    let responses = app.dispatch(serde_json::json!({"type": "UNKNOWN"})).await;
    assert_eq!(responses.len(), 1);
    assert_eq!(app.runner.snapshot().active_count(), 3);
}
