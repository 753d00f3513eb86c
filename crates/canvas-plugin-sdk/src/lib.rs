//! # canvas-plugin-sdk
//!
//! Everything a handler author needs in one place: the handler contract
//! from `canvas-plugin` plus typed builders for the effects the host
//! understands.
//!
//! ```rust,ignore
//! use canvas_plugin_sdk::prelude::*;
//!
//! #[derive(Debug, Default)]
//! struct Greeter;
//!
//! #[async_trait]
//! impl PluginHandler for Greeter {
//!     fn responds_to(&self) -> Vec<EventType> {
//!         vec![EventType::Unknown]
//!     }
//!
//!     async fn compute(&self, _event: &Event, _ctx: &HandlerContext) -> HandlerResult {
//!         Ok(Log::info("Hello, world!").apply()?.into())
//!     }
//! }
//! ```

pub mod effects;
pub mod prelude;

pub use canvas_plugin;
