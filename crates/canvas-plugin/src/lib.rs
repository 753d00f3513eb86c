//! # canvas-plugin
//!
//! Plugin framework for the Canvas plugin runner. Provides:
//!
//! - Typed events and effects exchanged with the host platform
//! - A static import sandbox that confines each plugin to its own package
//!   plus an allow-list of host modules
//! - A catalog of compiled-in handler implementations keyed by class path
//! - A loader that turns a plugins directory into an immutable registry
//!   snapshot
//! - A runner that hot-swaps the snapshot and dispatches events to handlers
//! - A synchronizer that reloads plugins on broadcast messages

pub mod catalog;
pub mod context;
pub mod dispatcher;
pub mod error;
pub mod events;
pub mod handler;
pub mod loader;
pub mod macros;
pub mod manifest;
pub mod prelude;
pub mod registry;
pub mod runner;
pub mod sandbox;
pub mod synchronizer;

pub use catalog::HandlerCatalog;
pub use context::HandlerContext;
pub use dispatcher::{EventDispatcher, HandlerResponse};
pub use error::{HandlerError, PluginError};
pub use events::definitions::{Event, EventType};
pub use events::effects::{Effect, EffectType, HandlerOutput, OutputItem};
pub use handler::{ClosureHandler, PluginHandler};
pub use loader::PluginLoader;
pub use registry::{LoadedHandler, PackageStatus, PluginState, RegistrySnapshot};
pub use runner::{PluginRunner, ReloadPluginsResponse};
pub use sandbox::{AllowList, Sandbox, SandboxError};
pub use synchronizer::{PluginSynchronizer, SyncChannel, SyncMessage};
