//! Response DTOs.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use canvas_plugin::registry::{LoadedHandler, PackageStatus, RegistrySnapshot};

/// Standard success response wrapper.
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T: Serialize> {
    /// Whether the request was served.
    pub success: bool,
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Creates a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Always `"ok"` when the server answers.
    pub status: String,
    /// Crate version.
    pub version: String,
    /// Seconds since start.
    pub uptime_seconds: i64,
    /// Active plugin packages.
    pub active_plugins: usize,
    /// Registered handlers.
    pub handlers: usize,
    /// When the registry was last rebuilt.
    pub registry_loaded_at: DateTime<Utc>,
}

/// Registry listing for `GET /api/plugins`.
#[derive(Debug, Clone, Serialize)]
pub struct PluginListResponse {
    /// When the registry was built.
    pub loaded_at: DateTime<Utc>,
    /// Every discovered package, active or not.
    pub packages: Vec<PackageStatus>,
    /// Handler records by key.
    pub handlers: Vec<LoadedHandler>,
    /// Event type → handler keys, in invocation order.
    pub event_handlers: BTreeMap<String, Vec<String>>,
}

impl From<&RegistrySnapshot> for PluginListResponse {
    fn from(snapshot: &RegistrySnapshot) -> Self {
        Self {
            loaded_at: snapshot.loaded_at,
            packages: snapshot.packages.clone(),
            handlers: snapshot.loaded_plugins().values().cloned().collect(),
            event_handlers: snapshot
                .event_handlers()
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        }
    }
}
