//! Patient banner alerts.

use serde::Serialize;

use canvas_plugin::error::HandlerError;
use canvas_plugin::events::effects::EffectType;

use super::{EffectBuilder, require};

/// Longest narrative the banner can display.
pub const MAX_NARRATIVE_LEN: usize = 90;

/// Where the banner is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BannerPlacement {
    /// Patient chart header.
    Chart,
    /// Timeline view.
    Timeline,
    /// Appointment card.
    AppointmentCard,
    /// Scheduling card.
    SchedulingCard,
    /// Patient profile.
    Profile,
}

/// Visual severity of the banner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BannerIntent {
    /// Neutral information.
    Info,
    /// Needs attention.
    Warning,
    /// Something is wrong.
    Alert,
}

/// Adds (or replaces, by key) a banner on a patient.
#[derive(Debug, Clone, Serialize)]
pub struct AddBannerAlert {
    /// Patient the banner belongs to.
    pub patient_id: String,
    /// Stable key; a later alert with the same key replaces this one.
    pub key: String,
    /// Banner text.
    pub narrative: String,
    /// Where to show it.
    pub placement: Vec<BannerPlacement>,
    /// Severity.
    pub intent: BannerIntent,
    /// Optional link target.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
}

impl AddBannerAlert {
    /// Creates an informational chart banner.
    pub fn new(
        patient_id: impl Into<String>,
        key: impl Into<String>,
        narrative: impl Into<String>,
    ) -> Self {
        Self {
            patient_id: patient_id.into(),
            key: key.into(),
            narrative: narrative.into(),
            placement: vec![BannerPlacement::Chart],
            intent: BannerIntent::Info,
            href: None,
        }
    }

    /// Sets the placements.
    pub fn placed(mut self, placement: Vec<BannerPlacement>) -> Self {
        self.placement = placement;
        self
    }

    /// Sets the intent.
    pub fn intent(mut self, intent: BannerIntent) -> Self {
        self.intent = intent;
        self
    }

    /// Sets the link target.
    pub fn href(mut self, href: impl Into<String>) -> Self {
        self.href = Some(href.into());
        self
    }
}

impl EffectBuilder for AddBannerAlert {
    fn effect_type(&self) -> EffectType {
        EffectType::AddBannerAlert
    }

    fn validate(&self) -> Result<(), HandlerError> {
        require("patient_id", &self.patient_id)?;
        require("key", &self.key)?;
        require("narrative", &self.narrative)?;
        if self.narrative.chars().count() > MAX_NARRATIVE_LEN {
            return Err(HandlerError::failed(format!(
                "'narrative' is longer than {MAX_NARRATIVE_LEN} characters"
            )));
        }
        if self.placement.is_empty() {
            return Err(HandlerError::failed("'placement' must not be empty"));
        }
        Ok(())
    }
}

/// Removes a banner by key.
#[derive(Debug, Clone, Serialize)]
pub struct RemoveBannerAlert {
    /// Patient the banner belongs to.
    pub patient_id: String,
    /// Key the banner was added with.
    pub key: String,
}

impl RemoveBannerAlert {
    /// Creates a removal.
    pub fn new(patient_id: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            patient_id: patient_id.into(),
            key: key.into(),
        }
    }
}

impl EffectBuilder for RemoveBannerAlert {
    fn effect_type(&self) -> EffectType {
        EffectType::RemoveBannerAlert
    }

    fn validate(&self) -> Result<(), HandlerError> {
        require("patient_id", &self.patient_id)?;
        require("key", &self.key)
    }
}
