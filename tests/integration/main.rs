//! Integration tests for the plugin runner HTTP API.

mod events_test;
mod health_test;
mod helpers;
mod plugins_test;
