//! Application builder: wires router, tracing layer, and state into an Axum app.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use canvas_core::config::AppConfig;
use canvas_core::error::AppError;
use canvas_plugin::catalog::HandlerCatalog;
use canvas_plugin::runner::PluginRunner;
use canvas_plugin::synchronizer::{PluginSynchronizer, SyncChannel, SyncMessage};

use crate::router::build_router;
use crate::state::AppState;

/// Builds the complete Axum application.
pub fn build_app(state: AppState) -> Router {
    build_router(state).layer(TraceLayer::new_for_http())
}

/// Loads plugins, starts the synchronizer, and serves the API until Ctrl+C.
pub async fn serve(config: AppConfig, catalog: HandlerCatalog) -> Result<(), AppError> {
    info!(
        directory = %config.plugins.directory,
        handler_classes = catalog.len(),
        "Starting plugin runner"
    );

    let channel = SyncChannel::new(config.plugins.sync_channel_capacity);
    let runner = Arc::new(
        PluginRunner::from_config(&config.plugins, Arc::new(catalog))
            .with_sync_channel(channel.clone()),
    );

    if config.plugins.auto_load {
        if let Err(e) = runner.load_plugins().await {
            warn!(error = %e, "Initial plugin load failed, starting with an empty registry");
        }
    }

    let sync_task = PluginSynchronizer::spawn(Arc::clone(&runner), &channel);
    let grace = Duration::from_secs(config.server.shutdown_grace_seconds);

    let result = run_server(AppState::new(Arc::new(config), runner)).await;

    channel.publish(SyncMessage::Shutdown);
    if tokio::time::timeout(grace, sync_task).await.is_err() {
        warn!(grace_secs = grace.as_secs(), "Synchronizer did not stop in time");
    }

    result
}

/// Serves the API for an already built state until Ctrl+C.
pub async fn run_server(state: AppState) -> Result<(), AppError> {
    let addr = state.config.server.bind_address();
    let app = build_app(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;

    info!(address = %addr, "Plugin runner listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::internal(format!("Server error: {e}")))?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    wait_for_signal(tokio::signal::ctrl_c()).await;
}

/// Resolves when `signal` fires. If the listener cannot be installed, the
/// server keeps running and never resolves.
async fn wait_for_signal<F>(signal: F)
where
    F: Future<Output = std::io::Result<()>>,
{
    if let Err(e) = signal.await {
        error!(error = %e, "Failed to listen for Ctrl+C, graceful shutdown disabled");
        std::future::pending::<()>().await;
    }
}
