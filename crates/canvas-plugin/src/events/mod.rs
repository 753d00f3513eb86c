//! Event and effect types exchanged with the host platform.

pub mod definitions;
pub mod effects;

pub use definitions::{Event, EventType};
pub use effects::{Effect, EffectType, HandlerOutput, OutputItem};
