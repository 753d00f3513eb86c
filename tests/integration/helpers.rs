//! Shared test helpers for integration tests.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use canvas_api::AppState;
use canvas_core::config::AppConfig;
use canvas_plugin::runner::PluginRunner;

/// Test application context
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    /// Runner behind the router
    pub runner: Arc<PluginRunner>,
    /// Plugin directory, a copy of `demos/plugins`
    pub plugins_dir: PathBuf,
    _tmp: TempDir,
}

impl TestApp {
    /// Create a new test application with the demo plugins loaded
    pub async fn new() -> Self {
        let tmp = TempDir::new().expect("Failed to create temp dir");
        let plugins_dir = tmp.path().join("plugins");
        copy_dir(
            &Path::new(env!("CARGO_MANIFEST_DIR")).join("demos/plugins"),
            &plugins_dir,
        );

        let mut config = AppConfig::default();
        config.plugins.directory = plugins_dir.display().to_string();
        config
            .plugins
            .environment
            .insert("BANNER_PREFIX".to_string(), "Welcome".to_string());

        let catalog = plugin_examples::catalog().expect("Failed to build catalog");
        let runner = Arc::new(PluginRunner::from_config(&config.plugins, Arc::new(catalog)));
        runner
            .load_plugins()
            .await
            .expect("Failed to load demo plugins");

        let state = AppState::new(Arc::new(config), Arc::clone(&runner));
        let router = canvas_api::build_app(state);

        Self {
            router,
            runner,
            plugins_dir,
            _tmp: tmp,
        }
    }

    /// Write a file into the plugin directory
    pub fn write_plugin_file(&self, rel: &str, body: &str) {
        let path = self.plugins_dir.join(rel);
        std::fs::create_dir_all(path.parent().expect("file has a parent"))
            .expect("Failed to create plugin dir");
        std::fs::write(path, body).expect("Failed to write plugin file");
    }

    /// Remove a plugin package from disk
    pub fn remove_plugin(&self, name: &str) {
        std::fs::remove_dir_all(self.plugins_dir.join(name)).expect("Failed to remove plugin");
    }

    /// Make a request against the router
    pub async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let body_str = body
            .map(|b| serde_json::to_string(&b).expect("Failed to serialize body"))
            .unwrap_or_default();

        let req = Request::builder()
            .method(method)
            .uri(path)
            .header("Content-Type", "application/json")
            .body(Body::from(body_str))
            .expect("Failed to build request");

        let response = self
            .router
            .clone()
            .oneshot(req)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("Failed to read body");

        let body: Value = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);

        TestResponse { status, body }
    }

    /// POST an event and return the `data` array
    pub async fn dispatch(&self, event: Value) -> Vec<Value> {
        let response = self.request("POST", "/api/events", Some(event)).await;
        assert_eq!(response.status, StatusCode::OK);
        response.body["data"]
            .as_array()
            .cloned()
            .expect("data should be an array")
    }
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Parsed JSON body
    pub body: Value,
}

fn copy_dir(from: &Path, to: &Path) {
    std::fs::create_dir_all(to).expect("Failed to create dir");
    for entry in std::fs::read_dir(from).expect("Failed to read dir") {
        let entry = entry.expect("Failed to read entry");
        let target = to.join(entry.file_name());
        if entry.path().is_dir() {
            copy_dir(&entry.path(), &target);
        } else {
            std::fs::copy(entry.path(), target).expect("Failed to copy file");
        }
    }
}
