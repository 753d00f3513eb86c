//! Application state shared across all handlers.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use canvas_core::config::AppConfig;
use canvas_plugin::runner::PluginRunner;

/// Passed to every Axum handler via `State<AppState>`.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// Plugin runner holding the live registry
    pub runner: Arc<PluginRunner>,
    /// Process start time
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Creates the state.
    pub fn new(config: Arc<AppConfig>, runner: Arc<PluginRunner>) -> Self {
        Self {
            config,
            runner,
            started_at: Utc::now(),
        }
    }
}
