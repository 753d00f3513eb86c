//! Typed effect builders.
//!
//! Each builder validates its fields and serializes to the payload shape
//! the host expects: `{"data": {...}}` for structured effects, the bare
//! message for logs.

pub mod banner_alert;
pub mod log;
pub mod protocol_card;
pub mod task;

use serde::Serialize;

use canvas_plugin::error::HandlerError;
use canvas_plugin::events::effects::{Effect, EffectType};

pub use banner_alert::{AddBannerAlert, BannerIntent, BannerPlacement, RemoveBannerAlert};
pub use log::Log;
pub use protocol_card::{CardStatus, ProtocolCard, Recommendation};
pub use task::{AddTask, TaskStatus};

/// A value that can be turned into an [`Effect`].
pub trait EffectBuilder: Serialize {
    /// Effect type the host dispatches on.
    fn effect_type(&self) -> EffectType;

    /// Checks field constraints before serialization.
    fn validate(&self) -> Result<(), HandlerError> {
        Ok(())
    }

    /// Validates and serializes into an effect.
    fn apply(&self) -> Result<Effect, HandlerError>
    where
        Self: Sized,
    {
        self.validate()?;
        Ok(Effect::json(self.effect_type(), &Payload { data: self })?)
    }
}

#[derive(Serialize)]
struct Payload<'a, T: Serialize> {
    data: &'a T,
}

pub(crate) fn require(field: &str, value: &str) -> Result<(), HandlerError> {
    if value.trim().is_empty() {
        return Err(HandlerError::failed(format!("'{field}' must not be empty")));
    }
    Ok(())
}
