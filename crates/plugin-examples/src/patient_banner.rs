//! Welcome banner for newly created patients.

use canvas_plugin_sdk::prelude::*;
use tracing::debug;

/// Banner key; a second event for the same patient replaces the banner.
pub const BANNER_KEY: &str = "new-patient-welcome";

/// Environment value overriding the banner text prefix.
pub const PREFIX_ENV: &str = "BANNER_PREFIX";

/// Banner text prefix when [`PREFIX_ENV`] is unset.
pub const DEFAULT_PREFIX: &str = "New patient";

/// Adds a chart banner when a patient is created.
#[derive(Debug, Default, Clone, Copy)]
pub struct PatientBanner;

#[async_trait]
impl PluginHandler for PatientBanner {
    fn responds_to(&self) -> Vec<EventType> {
        vec![EventType::PatientCreated]
    }

    async fn compute(&self, event: &Event, ctx: &HandlerContext) -> HandlerResult {
        let patient_id = event
            .target
            .as_deref()
            .ok_or_else(|| HandlerError::MissingContext("target".to_string()))?;

        let prefix = ctx.env(PREFIX_ENV).unwrap_or(DEFAULT_PREFIX);
        let narrative = match event.get_string("first_name") {
            Some(name) => format!("{prefix}: {name}"),
            None => prefix.to_string(),
        };

        debug!(patient = %patient_id, plugin = %ctx.plugin_name, "Adding welcome banner");

        let banner = AddBannerAlert::new(patient_id, BANNER_KEY, narrative)
            .placed(vec![BannerPlacement::Chart, BannerPlacement::Profile])
            .intent(BannerIntent::Info);

        Ok(banner.apply()?.into())
    }
}
