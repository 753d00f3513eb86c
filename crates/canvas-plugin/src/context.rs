//! Handler context: per-plugin secrets and environment.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use tracing::warn;

use crate::error::PluginError;

/// File inside a plugin directory holding secret values.
pub const SECRETS_FILE: &str = "SECRETS.json";

/// Values available to a handler besides the event itself.
///
/// Cloned per invocation; the maps are shared.
#[derive(Debug, Clone, Default)]
pub struct HandlerContext {
    /// Name of the plugin package the handler belongs to.
    pub plugin_name: String,
    secrets: Arc<HashMap<String, String>>,
    environment: Arc<HashMap<String, String>>,
}

impl HandlerContext {
    /// Creates a context.
    pub fn new(
        plugin_name: impl Into<String>,
        secrets: HashMap<String, String>,
        environment: Arc<HashMap<String, String>>,
    ) -> Self {
        Self {
            plugin_name: plugin_name.into(),
            secrets: Arc::new(secrets),
            environment,
        }
    }

    /// Looks up a secret.
    pub fn secret(&self, name: &str) -> Option<&str> {
        self.secrets.get(name).map(String::as_str)
    }

    /// Looks up an environment value.
    pub fn env(&self, name: &str) -> Option<&str> {
        self.environment.get(name).map(String::as_str)
    }
}

/// Reads `SECRETS.json` from a plugin directory, keeping only the names the
/// manifest declares. A missing file yields no secrets.
pub fn load_secrets(
    plugin_dir: &Path,
    plugin_name: &str,
    declared: &[String],
) -> Result<HashMap<String, String>, PluginError> {
    let path = plugin_dir.join(SECRETS_FILE);
    if !path.exists() {
        return Ok(HashMap::new());
    }

    let raw = std::fs::read_to_string(&path).map_err(|source| PluginError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let mut values: HashMap<String, String> =
        serde_json::from_str(&raw).map_err(|e| PluginError::Manifest {
            plugin: plugin_name.to_string(),
            reason: format!("{SECRETS_FILE} is not a string map: {e}"),
        })?;

    values.retain(|name, _| {
        let keep = declared.iter().any(|d| d == name);
        if !keep {
            warn!(plugin = %plugin_name, secret = %name, "Dropping undeclared secret");
        }
        keep
    });

    Ok(values)
}
