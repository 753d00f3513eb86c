//! Canvas plugin runner
//!
//! Main entry point that wires the plugin runtime to the HTTP API and
//! starts the server.

use tracing_subscriber::{EnvFilter, fmt};

use canvas_core::config::AppConfig;
use canvas_core::error::AppError;

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

/// Load configuration from `config/default.toml`, the environment overlay,
/// and `CANVAS__*` variables
fn load_configuration() -> Result<AppConfig, AppError> {
    let env = std::env::var("CANVAS_ENV").unwrap_or_else(|_| "development".to_string());
    AppConfig::load(&env)
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting Canvas plugin runner v{}", env!("CARGO_PKG_VERSION"));

    let catalog = plugin_examples::catalog()?;
    canvas_api::serve(config, catalog).await
}
