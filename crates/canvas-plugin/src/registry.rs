//! Registry snapshot: loaded packages, handlers, and the event map.
//!
//! A snapshot is built in full by the loader and never mutated afterwards.
//! The runner swaps whole snapshots on reload.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::context::HandlerContext;
use crate::handler::PluginHandler;

/// Lifecycle state of a plugin package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PluginState {
    /// Discovered, not yet processed.
    Unloaded,
    /// Manifest and sandbox checks in progress.
    Loading,
    /// Handlers registered.
    Active,
    /// Failed to load; no handlers registered.
    Inactive,
}

impl std::fmt::Display for PluginState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Unloaded => "unloaded",
            Self::Loading => "loading",
            Self::Active => "active",
            Self::Inactive => "inactive",
        };
        write!(f, "{s}")
    }
}

/// Status of one plugin directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageStatus {
    /// Package (directory) name.
    pub name: String,
    /// Directory path.
    pub path: String,
    /// Current state.
    pub state: PluginState,
    /// Why the package is inactive.
    pub error: Option<String>,
}

/// A registered handler class.
#[derive(Debug, Clone, Serialize)]
pub struct LoadedHandler {
    /// `package:module.path:ClassName`.
    pub key: String,
    /// Owning package.
    pub package_name: String,
    /// Dotted module path.
    pub module_path: String,
    /// Class name.
    pub class_name: String,
    /// Whether the handler receives events.
    pub is_active: bool,
    /// Event type names the handler declared interest in.
    pub responds_to: Vec<String>,
    /// Load error, if any.
    pub error: Option<String>,
    /// The handler instance.
    #[serde(skip)]
    pub handler: Option<Arc<dyn PluginHandler>>,
    /// Context passed to every compute call.
    #[serde(skip)]
    pub context: HandlerContext,
}

impl LoadedHandler {
    /// Builds the registry key for a class.
    pub fn key_for(package: &str, module_path: &str, class_name: &str) -> String {
        format!("{package}:{module_path}:{class_name}")
    }
}

impl PartialEq for LoadedHandler {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
            && self.package_name == other.package_name
            && self.module_path == other.module_path
            && self.class_name == other.class_name
            && self.is_active == other.is_active
            && self.responds_to == other.responds_to
            && self.error == other.error
    }
}

/// Immutable view of everything loaded in one pass.
#[derive(Debug, Clone)]
pub struct RegistrySnapshot {
    /// Every discovered package, in discovery order.
    pub packages: Vec<PackageStatus>,
    /// Handler key → handler.
    pub handlers: BTreeMap<String, LoadedHandler>,
    /// Event type name → handler keys, in discovery order.
    pub event_handlers: HashMap<String, Vec<String>>,
    /// When the snapshot was built.
    pub loaded_at: DateTime<Utc>,
}

impl Default for RegistrySnapshot {
    fn default() -> Self {
        Self::empty()
    }
}

impl RegistrySnapshot {
    /// A snapshot with nothing loaded.
    pub fn empty() -> Self {
        Self {
            packages: Vec::new(),
            handlers: BTreeMap::new(),
            event_handlers: HashMap::new(),
            loaded_at: Utc::now(),
        }
    }

    /// Active handlers for an event type, in invocation order.
    pub fn handlers_for(&self, event_type: &str) -> Vec<&LoadedHandler> {
        self.event_handlers
            .get(event_type)
            .map(|keys| {
                keys.iter()
                    .filter_map(|key| self.handlers.get(key))
                    .filter(|h| h.is_active)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// All handler records (LOADED_PLUGINS).
    pub fn loaded_plugins(&self) -> &BTreeMap<String, LoadedHandler> {
        &self.handlers
    }

    /// Event type → handler keys (EVENT_PROTOCOL_MAP).
    pub fn event_handlers(&self) -> &HashMap<String, Vec<String>> {
        &self.event_handlers
    }

    /// Status of one package.
    pub fn package(&self, name: &str) -> Option<&PackageStatus> {
        self.packages.iter().find(|p| p.name == name)
    }

    /// Number of active packages.
    pub fn active_count(&self) -> usize {
        self.packages
            .iter()
            .filter(|p| p.state == PluginState::Active)
            .count()
    }

    /// Same packages, handlers, and event map; `loaded_at` is ignored.
    pub fn same_contents(&self, other: &Self) -> bool {
        self.packages == other.packages
            && self.handlers == other.handlers
            && self.event_handlers == other.event_handlers
    }
}
