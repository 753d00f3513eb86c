//! Route definitions, all mounted under `/api`.

use axum::Router;
use axum::routing::{get, post};

use crate::handlers;
use crate::state::AppState;

/// Builds the router with every route bound to `state`.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .merge(event_routes())
        .merge(plugin_routes())
        .merge(health_routes());

    Router::new().nest("/api", api_routes).with_state(state)
}

/// HandleEvent
fn event_routes() -> Router<AppState> {
    Router::new().route("/events", post(handlers::events::handle_event))
}

/// Registry listing and ReloadPlugins
fn plugin_routes() -> Router<AppState> {
    Router::new()
        .route("/plugins", get(handlers::plugins::list_plugins))
        .route("/plugins/reload", post(handlers::plugins::reload_plugins))
}

fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health::health))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::Value;
    use tower::ServiceExt;

    use canvas_core::config::AppConfig;
    use canvas_plugin::catalog::HandlerCatalog;
    use canvas_plugin::dispatcher::EventDispatcher;
    use canvas_plugin::loader::PluginLoader;
    use canvas_plugin::runner::PluginRunner;

    use super::*;

    fn router() -> Router {
        let loader = PluginLoader::new("/nonexistent", Arc::new(HandlerCatalog::new()));
        let runner = Arc::new(PluginRunner::new(loader, EventDispatcher::default()));
        build_router(AppState::new(Arc::new(AppConfig::default()), runner))
    }

    async fn send(method: &str, path: &str, body: Option<Value>) -> (StatusCode, Value) {
        let body = body.map(|b| b.to_string()).unwrap_or_default();
        let req = Request::builder()
            .method(method)
            .uri(path)
            .header("Content-Type", "application/json")
            .body(Body::from(body))
            .unwrap();

        let response = router().oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    #[tokio::test]
    async fn test_health_with_empty_registry() {
        let (status, body) = send("GET", "/api/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], "ok");
        assert_eq!(body["data"]["handlers"], 0);
    }

    #[tokio::test]
    async fn test_event_without_handlers_yields_empty_list() {
        let (status, body) = send(
            "POST",
            "/api/events",
            Some(serde_json::json!({"type": "PATIENT_CREATED"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_blank_event_type_is_bad_request() {
        let (status, body) =
            send("POST", "/api/events", Some(serde_json::json!({"type": ""}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_reload_of_missing_directory_reports_failure() {
        let (status, body) = send("POST", "/api/plugins/reload", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"][0]["success"], false);
    }
}
