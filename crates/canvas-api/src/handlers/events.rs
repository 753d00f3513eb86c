//! `HandleEvent` over HTTP.

use axum::Json;
use axum::extract::State;
use futures::StreamExt;

use canvas_plugin::dispatcher::HandlerResponse;

use crate::dto::request::HandleEventRequest;
use crate::dto::response::ApiResponse;
use crate::error::ApiError;
use crate::state::AppState;

/// POST /api/events
///
/// Responds with one entry per handler registered for the event type, in
/// invocation order. Handler failures are entries with `success: false`,
/// not HTTP errors.
pub async fn handle_event(
    State(state): State<AppState>,
    Json(req): Json<HandleEventRequest>,
) -> Result<Json<ApiResponse<Vec<HandlerResponse>>>, ApiError> {
    let event = req.into_event()?;
    let responses: Vec<HandlerResponse> = state.runner.handle_event(event).collect().await;
    Ok(Json(ApiResponse::ok(responses)))
}
