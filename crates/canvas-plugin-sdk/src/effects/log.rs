//! Log effect.

use serde::Serialize;

use canvas_plugin::error::HandlerError;
use canvas_plugin::events::effects::{Effect, EffectType};

use super::EffectBuilder;

/// A message written to the host's plugin log.
#[derive(Debug, Clone, Serialize)]
pub struct Log {
    /// Message text.
    pub message: String,
}

impl Log {
    /// Creates a log effect.
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl EffectBuilder for Log {
    fn effect_type(&self) -> EffectType {
        EffectType::Log
    }

    /// The payload is the plain message, not a `data` object.
    fn apply(&self) -> Result<Effect, HandlerError>
    where
        Self: Sized,
    {
        Ok(Effect::log(self.message.clone()))
    }
}
