//! Registry listing and `ReloadPlugins` over HTTP.

use axum::Json;
use axum::extract::State;
use futures::StreamExt;

use canvas_plugin::runner::ReloadPluginsResponse;

use crate::dto::response::{ApiResponse, PluginListResponse};
use crate::state::AppState;

/// GET /api/plugins
pub async fn list_plugins(State(state): State<AppState>) -> Json<ApiResponse<PluginListResponse>> {
    let snapshot = state.runner.snapshot();
    Json(ApiResponse::ok(PluginListResponse::from(snapshot.as_ref())))
}

/// POST /api/plugins/reload
///
/// A failed reload is reported as `success: false` in the single response
/// entry; the previous registry stays live.
pub async fn reload_plugins(
    State(state): State<AppState>,
) -> Json<ApiResponse<Vec<ReloadPluginsResponse>>> {
    let responses: Vec<ReloadPluginsResponse> =
        state.runner.reload_plugins().await.collect().await;
    Json(ApiResponse::ok(responses))
}
