//! Table and JSON output formatting for CLI commands.

use serde::Serialize;
use tabled::{Table, Tabled};

use canvas_plugin::dispatcher::HandlerResponse;
use canvas_plugin::registry::{LoadedHandler, PackageStatus};

/// Output format selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    #[default]
    Table,
    /// JSON output
    Json,
}

/// Table row for a plugin package.
#[derive(Debug, Serialize, Tabled)]
pub struct PackageRow {
    #[tabled(rename = "Package")]
    pub name: String,
    #[tabled(rename = "State")]
    pub state: String,
    #[tabled(rename = "Path")]
    pub path: String,
    #[tabled(rename = "Error")]
    pub error: String,
}

impl From<&PackageStatus> for PackageRow {
    fn from(status: &PackageStatus) -> Self {
        Self {
            name: status.name.clone(),
            state: status.state.to_string(),
            path: status.path.clone(),
            error: status.error.clone().unwrap_or_default(),
        }
    }
}

/// Table row for a loaded handler.
#[derive(Debug, Serialize, Tabled)]
pub struct HandlerRow {
    #[tabled(rename = "Handler")]
    pub key: String,
    #[tabled(rename = "Active")]
    pub is_active: bool,
    #[tabled(rename = "Responds to")]
    pub responds_to: String,
}

impl From<&LoadedHandler> for HandlerRow {
    fn from(handler: &LoadedHandler) -> Self {
        Self {
            key: handler.key.clone(),
            is_active: handler.is_active,
            responds_to: handler.responds_to.join(", "),
        }
    }
}

/// Table row for one handler invocation.
#[derive(Debug, Serialize, Tabled)]
pub struct ResponseRow {
    #[tabled(rename = "Handler")]
    pub handler: String,
    #[tabled(rename = "Ok")]
    pub success: bool,
    #[tabled(rename = "Effects")]
    pub effects: String,
    #[tabled(rename = "ms")]
    pub duration_ms: u64,
    #[tabled(rename = "Error")]
    pub error: String,
}

impl From<&HandlerResponse> for ResponseRow {
    fn from(response: &HandlerResponse) -> Self {
        Self {
            handler: response.handler.clone(),
            success: response.success,
            effects: response
                .effects
                .iter()
                .map(|e| e.effect_type.to_string())
                .collect::<Vec<_>>()
                .join(", "),
            duration_ms: response.duration_ms,
            error: response.error.clone().unwrap_or_default(),
        }
    }
}

/// Print a list of items in the selected format
pub fn print_list<T: Serialize + Tabled>(items: &[T], format: OutputFormat) {
    match format {
        OutputFormat::Table => {
            if items.is_empty() {
                println!("No results found.");
            } else {
                let table = Table::new(items).to_string();
                println!("{}", table);
            }
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(items).unwrap_or_else(|_| "[]".to_string());
            println!("{}", json);
        }
    }
}

/// Print a single item in the selected format
pub fn print_item<T: Serialize + std::fmt::Debug>(item: &T, format: OutputFormat) {
    match format {
        OutputFormat::Table => {
            println!("{:#?}", item);
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(item).unwrap_or_else(|_| "{}".to_string());
            println!("{}", json);
        }
    }
}

/// Print a success message
pub fn print_success(msg: &str) {
    println!("✓ {}", msg);
}

/// Print a warning message
pub fn print_warning(msg: &str) {
    println!("⚠ {}", msg);
}

/// Print an error message
pub fn print_error(msg: &str) {
    eprintln!("✗ {}", msg);
}

/// Print a key-value pair
pub fn print_kv(key: &str, value: &str) {
    println!("  {:<24} {}", format!("{}:", key), value);
}
