//! Protocol cards shown in the patient's care-gap panel.

use serde::Serialize;

use canvas_plugin::error::HandlerError;
use canvas_plugin::events::effects::EffectType;

use super::{EffectBuilder, require};

/// Card state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CardStatus {
    /// Action is due.
    Due,
    /// Criteria satisfied.
    Satisfied,
    /// Patient not eligible.
    NotApplicable,
    /// Waiting on data.
    Pending,
}

/// A suggested next step on a card.
#[derive(Debug, Clone, Serialize)]
pub struct Recommendation {
    /// Button title.
    pub title: String,
    /// Action name understood by the host.
    pub button: String,
    /// Optional link target.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
}

/// Adds or updates a protocol card, keyed by `key`.
#[derive(Debug, Clone, Serialize)]
pub struct ProtocolCard {
    /// Patient the card belongs to.
    pub patient_id: String,
    /// Stable card key.
    pub key: String,
    /// Card title.
    pub title: String,
    /// Explanation shown under the title.
    pub narrative: String,
    /// Current state.
    pub status: CardStatus,
    /// Suggested actions.
    pub recommendations: Vec<Recommendation>,
}

impl ProtocolCard {
    /// Creates a due card with no recommendations.
    pub fn new(
        patient_id: impl Into<String>,
        key: impl Into<String>,
        title: impl Into<String>,
    ) -> Self {
        Self {
            patient_id: patient_id.into(),
            key: key.into(),
            title: title.into(),
            narrative: String::new(),
            status: CardStatus::Due,
            recommendations: Vec::new(),
        }
    }

    /// Sets the narrative.
    pub fn narrative(mut self, narrative: impl Into<String>) -> Self {
        self.narrative = narrative.into();
        self
    }

    /// Sets the status.
    pub fn status(mut self, status: CardStatus) -> Self {
        self.status = status;
        self
    }

    /// Appends a recommendation.
    pub fn recommend(mut self, title: impl Into<String>, button: impl Into<String>) -> Self {
        self.recommendations.push(Recommendation {
            title: title.into(),
            button: button.into(),
            href: None,
        });
        self
    }
}

impl EffectBuilder for ProtocolCard {
    fn effect_type(&self) -> EffectType {
        EffectType::AddOrUpdateProtocolCard
    }

    fn validate(&self) -> Result<(), HandlerError> {
        require("patient_id", &self.patient_id)?;
        require("key", &self.key)?;
        require("title", &self.title)
    }
}
