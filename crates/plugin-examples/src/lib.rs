//! # Plugin Examples
//!
//! Reference handlers compiled into the runner. Each one is bound to the
//! class path its plugin manifest names, so dropping the matching plugin
//! directory into the plugins folder activates it.

pub mod appointment_followup;
pub mod hello_world;
pub mod patient_banner;

use canvas_plugin::catalog::HandlerCatalog;
use canvas_plugin::error::PluginError;
use canvas_plugin::register_handlers;

pub use appointment_followup::AppointmentFollowUp;
pub use hello_world::HelloWorld;
pub use patient_banner::PatientBanner;

/// Class path of [`HelloWorld`].
pub const HELLO_WORLD_CLASS: &str = "example_plugin.protocols.my_protocol:Protocol";
/// Class path of [`PatientBanner`].
pub const PATIENT_BANNER_CLASS: &str = "patient_banner.handlers.banner:PatientBanner";
/// Class path of [`AppointmentFollowUp`].
pub const APPOINTMENT_FOLLOWUP_CLASS: &str =
    "appointment_followup.handlers.followup:AppointmentFollowUp";

/// Registers every example handler.
pub fn register(catalog: &mut HandlerCatalog) -> Result<(), PluginError> {
    register_handlers!(catalog, {
        HELLO_WORLD_CLASS => HelloWorld,
        PATIENT_BANNER_CLASS => PatientBanner,
        APPOINTMENT_FOLLOWUP_CLASS => AppointmentFollowUp::default(),
    })
}

/// A catalog holding only the example handlers.
pub fn catalog() -> Result<HandlerCatalog, PluginError> {
    let mut catalog = HandlerCatalog::new();
    register(&mut catalog)?;
    Ok(catalog)
}
