//! Event dispatcher: invokes handlers and normalizes their output.
//!
//! Handlers for one event run sequentially in registry order. Each call is
//! bounded by a timeout and isolated from panics; a failure is reported for
//! that handler alone and dispatch moves on to the next one.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::stream::{self, BoxStream, StreamExt};
use futures::FutureExt;
use serde::Serialize;
use tracing::{debug, error};

use crate::events::definitions::Event;
use crate::events::effects::Effect;
use crate::registry::{LoadedHandler, RegistrySnapshot};

/// Default upper bound on a single compute call.
pub const DEFAULT_HANDLER_TIMEOUT: Duration = Duration::from_secs(30);

/// Outcome of one handler invocation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HandlerResponse {
    /// Handler key.
    pub handler: String,
    /// Whether compute returned normally.
    pub success: bool,
    /// Normalized effects; empty on failure.
    pub effects: Vec<Effect>,
    /// Failure reason.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Wall time of the call in milliseconds.
    pub duration_ms: u64,
}

impl HandlerResponse {
    fn success(handler: &str, effects: Vec<Effect>, started: Instant) -> Self {
        Self {
            handler: handler.to_string(),
            success: true,
            effects,
            error: None,
            duration_ms: elapsed_ms(started),
        }
    }

    fn failure(handler: &str, error: String, started: Instant) -> Self {
        Self {
            handler: handler.to_string(),
            success: false,
            effects: Vec::new(),
            error: Some(error),
            duration_ms: elapsed_ms(started),
        }
    }
}

/// Invokes handlers with a timeout and panic isolation.
#[derive(Debug, Clone)]
pub struct EventDispatcher {
    timeout: Duration,
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new(DEFAULT_HANDLER_TIMEOUT)
    }
}

impl EventDispatcher {
    /// Creates a dispatcher with the given per-handler timeout.
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Per-handler timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Streams one response per handler registered for the event type.
    ///
    /// The snapshot is captured once, so a reload during dispatch does not
    /// affect which handlers run.
    pub fn dispatch(
        &self,
        snapshot: Arc<RegistrySnapshot>,
        event: Event,
    ) -> BoxStream<'static, HandlerResponse> {
        let keys: Vec<String> = snapshot
            .handlers_for(event.event_type.name())
            .iter()
            .map(|h| h.key.clone())
            .collect();

        debug!(
            event_type = %event.event_type,
            handler_count = keys.len(),
            "Dispatching event"
        );

        let dispatcher = self.clone();
        let event = Arc::new(event);

        stream::iter(keys)
            .then(move |key| {
                let dispatcher = dispatcher.clone();
                let snapshot = Arc::clone(&snapshot);
                let event = Arc::clone(&event);
                async move {
                    match snapshot.handlers.get(&key) {
                        Some(handler) => dispatcher.invoke(handler, &event).await,
                        None => HandlerResponse::failure(
                            &key,
                            "handler is not registered".to_string(),
                            Instant::now(),
                        ),
                    }
                }
            })
            .boxed()
    }

    /// Invokes one handler.
    pub async fn invoke(&self, loaded: &LoadedHandler, event: &Event) -> HandlerResponse {
        let started = Instant::now();

        let Some(handler) = &loaded.handler else {
            return HandlerResponse::failure(
                &loaded.key,
                "handler is not loaded".to_string(),
                started,
            );
        };

        let call = AssertUnwindSafe(handler.compute(event, &loaded.context)).catch_unwind();

        match tokio::time::timeout(self.timeout, call).await {
            Err(_) => {
                error!(
                    handler = %loaded.key,
                    event_type = %event.event_type,
                    timeout_secs = self.timeout.as_secs_f64(),
                    "Handler timed out"
                );
                HandlerResponse::failure(
                    &loaded.key,
                    format!("handler timed out after {:?}", self.timeout),
                    started,
                )
            }
            Ok(Err(panic)) => {
                let message = panic_message(panic.as_ref());
                error!(
                    handler = %loaded.key,
                    event_type = %event.event_type,
                    panic = %message,
                    "Handler panicked"
                );
                HandlerResponse::failure(&loaded.key, format!("handler panicked: {message}"), started)
            }
            Ok(Ok(Err(err))) => {
                error!(
                    handler = %loaded.key,
                    event_type = %event.event_type,
                    error = %err,
                    "Error in handler compute"
                );
                HandlerResponse::failure(&loaded.key, err.to_string(), started)
            }
            Ok(Ok(Ok(output))) => {
                let returned = output.len();
                let effects = output.into_effects();
                if effects.len() < returned {
                    debug!(
                        handler = %loaded.key,
                        dropped = returned - effects.len(),
                        "Dropped non-effect items from handler output"
                    );
                }
                debug!(
                    handler = %loaded.key,
                    effects = effects.len(),
                    "Handler completed"
                );
                HandlerResponse::success(&loaded.key, effects, started)
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
