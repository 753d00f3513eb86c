//! CLI command definitions and dispatch.

pub mod config;
pub mod dispatch;
pub mod plugins;
pub mod serve;

use std::sync::Arc;

use clap::{Parser, Subcommand};

use crate::output::OutputFormat;
use canvas_core::config::AppConfig;
use canvas_core::error::AppError;
use canvas_plugin::catalog::HandlerCatalog;

/// Canvas plugin runner
#[derive(Debug, Parser)]
#[command(name = "canvas", version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Start the plugin runner server
    Serve(serve::ServeArgs),
    /// Inspect plugin packages
    Plugins(plugins::PluginsArgs),
    /// Load plugins and dispatch a single event
    Dispatch(dispatch::DispatchArgs),
    /// Configuration management
    Config(config::ConfigArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self) -> Result<(), AppError> {
        match &self.command {
            Commands::Serve(args) => serve::execute(args, &self.config).await,
            Commands::Plugins(args) => plugins::execute(args, &self.config, self.format).await,
            Commands::Dispatch(args) => dispatch::execute(args, &self.config, self.format).await,
            Commands::Config(args) => config::execute(args, &self.config, self.format).await,
        }
    }
}

/// Helper: load configuration from file
pub async fn load_config(config_path: &str) -> Result<AppConfig, AppError> {
    AppConfig::load_file(config_path)
        .map_err(|e| AppError::internal(format!("Failed to load config: {}", e)))
}

/// Helper: catalog of the handler classes compiled into this binary
pub fn load_catalog() -> Result<Arc<HandlerCatalog>, AppError> {
    Ok(Arc::new(plugin_examples::catalog()?))
}
