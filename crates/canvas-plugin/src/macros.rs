//! Convenience macros for handler development.

/// Macro for quickly building an `Event`.
///
/// # Example
/// ```rust,ignore
/// let event = event!(EventType::PatientCreated, target: "p-1", "Patient", {
///     "first_name" => json!("Ada"),
/// });
/// ```
#[macro_export]
macro_rules! event {
    ($event_type:expr) => {
        $crate::events::definitions::Event::new($event_type)
    };
    ($event_type:expr, { $($key:expr => $value:expr),* $(,)? }) => {{
        #[allow(unused_mut)]
        let mut event = $crate::events::definitions::Event::new($event_type);
        $(
            event.context.insert($key.to_string(), $value);
        )*
        event
    }};
    ($event_type:expr, target: $target:expr, $target_type:expr, { $($key:expr => $value:expr),* $(,)? }) => {{
        #[allow(unused_mut)]
        let mut event = $crate::events::definitions::Event::new($event_type)
            .with_target($target, $target_type);
        $(
            event.context.insert($key.to_string(), $value);
        )*
        event
    }};
}

/// Registers handler types in a catalog under their class paths.
///
/// Each constructor expression is evaluated on every load, so each
/// reload gets fresh handler instances. Evaluates to
/// `Result<(), PluginError>`.
///
/// # Example
/// ```rust,ignore
/// register_handlers!(catalog, {
///     "example_plugin.protocols.my_protocol:Protocol" => HelloWorld,
/// })?;
/// ```
#[macro_export]
macro_rules! register_handlers {
    ($catalog:expr, { $($class_path:expr => $ctor:expr),* $(,)? }) => {{
        let catalog: &mut $crate::catalog::HandlerCatalog = $catalog;
        let mut result: ::std::result::Result<(), $crate::error::PluginError> = Ok(());
        $(
            if result.is_ok() {
                result = catalog.register(
                    $class_path,
                    || -> ::std::sync::Arc<dyn $crate::handler::PluginHandler> {
                        ::std::sync::Arc::new($ctor)
                    },
                );
            }
        )*
        result
    }};
}
