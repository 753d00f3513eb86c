//! Route handlers.

pub mod events;
pub mod health;
pub mod plugins;
