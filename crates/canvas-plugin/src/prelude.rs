//! Prelude for convenient imports.

pub use async_trait::async_trait;

pub use crate::catalog::HandlerCatalog;
pub use crate::context::HandlerContext;
pub use crate::error::{HandlerError, PluginError};
pub use crate::events::definitions::{Event, EventType};
pub use crate::events::effects::{Effect, EffectType, HandlerOutput, OutputItem};
pub use crate::handler::{ClosureHandler, HandlerResult, PluginHandler};

pub use crate::{event, register_handlers};
