//! Plugin system configuration.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Plugin loading and dispatch configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginConfig {
    /// Directory containing one subdirectory per plugin package.
    #[serde(default = "default_plugin_directory")]
    pub directory: String,
    /// Whether to load plugins on startup.
    #[serde(default = "default_true")]
    pub auto_load: bool,
    /// Upper bound on a single handler's compute call, in seconds.
    #[serde(default = "default_handler_timeout")]
    pub handler_timeout_seconds: u64,
    /// File extension of plugin module sources scanned by the sandbox.
    #[serde(default = "default_module_extension")]
    pub module_extension: String,
    /// Environment values exposed to every handler.
    #[serde(default)]
    pub environment: HashMap<String, String>,
    /// Buffer size of the reload broadcast channel.
    #[serde(default = "default_sync_capacity")]
    pub sync_channel_capacity: usize,
    /// Import sandbox settings.
    #[serde(default)]
    pub sandbox: SandboxConfig,
}

/// Import sandbox settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SandboxConfig {
    /// Additional allowed modules, mapped to the names importable from them.
    /// A `"*"` entry allows any name.
    #[serde(default)]
    pub extra_allowed_modules: HashMap<String, Vec<String>>,
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            directory: default_plugin_directory(),
            auto_load: true,
            handler_timeout_seconds: default_handler_timeout(),
            module_extension: default_module_extension(),
            environment: HashMap::new(),
            sync_channel_capacity: default_sync_capacity(),
            sandbox: SandboxConfig::default(),
        }
    }
}

fn default_plugin_directory() -> String {
    "./plugins".to_string()
}

fn default_true() -> bool {
    true
}

fn default_handler_timeout() -> u64 {
    30
}

fn default_module_extension() -> String {
    "py".to_string()
}

fn default_sync_capacity() -> usize {
    16
}
