//! Plugin inspection commands.

use std::path::PathBuf;

use clap::{Args, Subcommand};

use crate::output::{self, HandlerRow, OutputFormat, PackageRow};
use canvas_core::error::AppError;
use canvas_plugin::loader::PluginLoader;
use canvas_plugin::registry::PluginState;

/// Arguments for plugin commands
#[derive(Debug, Args)]
pub struct PluginsArgs {
    /// Plugin subcommand
    #[command(subcommand)]
    pub command: PluginsCommand,
}

/// Plugin subcommands
#[derive(Debug, Subcommand)]
pub enum PluginsCommand {
    /// Load the plugin directory and list every package
    List,
    /// List registered handlers and the events they respond to
    Handlers,
    /// Run the sandbox and manifest checks against one plugin directory
    Check {
        /// Path to the plugin directory
        path: PathBuf,
    },
    /// List handler classes compiled into this binary
    Classes,
}

/// Execute plugin commands
pub async fn execute(
    args: &PluginsArgs,
    config_path: &str,
    format: OutputFormat,
) -> Result<(), AppError> {
    let config = super::load_config(config_path).await?;
    let loader = PluginLoader::from_config(&config.plugins, super::load_catalog()?);

    match &args.command {
        PluginsCommand::List => {
            let snapshot = loader.load()?;
            let rows: Vec<PackageRow> = snapshot.packages.iter().map(PackageRow::from).collect();
            output::print_list(&rows, format);

            let inactive = snapshot
                .packages
                .iter()
                .filter(|p| p.state == PluginState::Inactive)
                .count();
            if inactive > 0 && format == OutputFormat::Table {
                output::print_warning(&format!("{} package(s) failed to load", inactive));
            }
        }
        PluginsCommand::Handlers => {
            let snapshot = loader.load()?;
            let rows: Vec<HandlerRow> = snapshot
                .loaded_plugins()
                .values()
                .map(HandlerRow::from)
                .collect();
            output::print_list(&rows, format);
        }
        PluginsCommand::Check { path } => match loader.check_plugin(path) {
            Ok(handlers) => {
                if format == OutputFormat::Table {
                    output::print_success(&format!("Plugin '{}' is valid", path.display()));
                }
                let rows: Vec<HandlerRow> = handlers.iter().map(HandlerRow::from).collect();
                output::print_list(&rows, format);
            }
            Err(e) => {
                output::print_error(&format!("Plugin '{}' is invalid: {}", path.display(), e));
                return Err(e.into());
            }
        },
        PluginsCommand::Classes => {
            for class_path in loader.catalog().class_paths() {
                println!("{}", class_path);
            }
        }
    }

    Ok(())
}
