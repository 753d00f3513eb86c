//! # canvas-api
//!
//! HTTP API layer for the Canvas plugin runner built on Axum.
//!
//! Exposes the runner's two RPC operations, `HandleEvent` and
//! `ReloadPlugins`, plus a registry listing and a health check. Streamed
//! RPC responses are collected into JSON arrays.

pub mod app;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod router;
pub mod state;

pub use app::{build_app, run_server, serve};
pub use error::ApiError;
pub use state::AppState;
