//! Start the plugin runner server.

use clap::Args;

use canvas_core::error::AppError;

/// Arguments for the serve command
#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Override the server port
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Override the server host
    #[arg(long)]
    pub host: Option<String>,

    /// Override the plugin directory
    #[arg(long)]
    pub plugins_dir: Option<String>,
}

/// Execute the serve command
pub async fn execute(args: &ServeArgs, config_path: &str) -> Result<(), AppError> {
    let mut config = super::load_config(config_path).await?;

    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(ref host) = args.host {
        config.server.host = host.clone();
    }
    if let Some(ref dir) = args.plugins_dir {
        config.plugins.directory = dir.clone();
    }

    println!("Starting plugin runner...");
    println!("  Host: {}", config.server.host);
    println!("  Port: {}", config.server.port);
    println!("  Plugins: {}", config.plugins.directory);

    let catalog = plugin_examples::catalog()?;
    canvas_api::serve(config, catalog).await
}
