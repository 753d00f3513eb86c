//! Dispatch a single event against the configured plugins.

use clap::Args;
use futures::StreamExt;

use crate::output::{self, OutputFormat, ResponseRow};
use canvas_core::error::AppError;
use canvas_plugin::dispatcher::HandlerResponse;
use canvas_plugin::events::definitions::{Event, EventType};
use canvas_plugin::runner::PluginRunner;

/// Arguments for the dispatch command
#[derive(Debug, Args)]
pub struct DispatchArgs {
    /// Event type name, e.g. PATIENT_CREATED
    pub event_type: String,

    /// Target record identifier
    #[arg(short, long)]
    pub target: Option<String>,

    /// Target record kind
    #[arg(long)]
    pub target_type: Option<String>,

    /// Event context as a JSON object
    #[arg(long)]
    pub context: Option<String>,
}

/// Execute the dispatch command
pub async fn execute(
    args: &DispatchArgs,
    config_path: &str,
    format: OutputFormat,
) -> Result<(), AppError> {
    let config = super::load_config(config_path).await?;
    let runner = PluginRunner::from_config(&config.plugins, super::load_catalog()?);
    runner.load_plugins().await?;

    let event = build_event(args)?;
    let responses: Vec<HandlerResponse> = runner.handle_event(event).collect().await;

    match format {
        OutputFormat::Json => output::print_item(&responses, format),
        OutputFormat::Table => {
            let rows: Vec<ResponseRow> = responses.iter().map(ResponseRow::from).collect();
            output::print_list(&rows, format);
            for response in &responses {
                for effect in &response.effects {
                    output::print_kv(effect.effect_type.name(), &effect.payload);
                }
            }
        }
    }

    Ok(())
}

fn build_event(args: &DispatchArgs) -> Result<Event, AppError> {
    let name = args.event_type.trim();
    if name.is_empty() {
        return Err(AppError::validation("Event type must not be empty"));
    }

    let mut event = Event::new(EventType::from_name(name));
    event.target = args.target.clone();
    event.target_type = args.target_type.clone();

    if let Some(ref raw) = args.context {
        let value: serde_json::Value = serde_json::from_str(raw)
            .map_err(|e| AppError::validation(format!("Invalid context JSON: {}", e)))?;
        match value {
            serde_json::Value::Object(map) => event.context = map,
            _ => return Err(AppError::validation("Context must be a JSON object")),
        }
    }

    Ok(event)
}
