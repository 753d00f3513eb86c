//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section.

pub mod logging;
pub mod plugin;
pub mod server;

use serde::{Deserialize, Serialize};

pub use self::logging::LoggingConfig;
pub use self::plugin::{PluginConfig, SandboxConfig};
pub use self::server::ServerConfig;

use tracing::{debug, info};

use crate::error::AppError;

/// Prefix for environment variable overrides (`CANVAS__PLUGINS__DIRECTORY`).
pub const ENV_PREFIX: &str = "CANVAS";

/// Root application configuration.
///
/// Top-level deserialization target for the merged TOML configuration
/// files (`default.toml` + environment overlay).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Plugin loading and dispatch settings.
    #[serde(default)]
    pub plugins: PluginConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration for the given environment.
    ///
    /// Merges `config/default` with `config/{env}` and environment
    /// variables prefixed with `CANVAS__`.
    pub fn load(env: &str) -> Result<Self, AppError> {
        debug!(env = %env, "Loading layered configuration");

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        let config: Self = config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))?;
        config.log_resolved();
        Ok(config)
    }

    fn log_resolved(&self) {
        info!(
            bind = %self.server.bind_address(),
            plugins_dir = %self.plugins.directory,
            log_level = %self.logging.level,
            "Configuration loaded"
        );
    }

    /// Load configuration from a single file, still honouring environment
    /// variable overrides. A missing file yields the defaults.
    pub fn load_file(path: &str) -> Result<Self, AppError> {
        debug!(path = %path, "Loading configuration file");

        let config = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        let config: Self = config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))?;
        config.log_resolved();
        Ok(config)
    }
}
