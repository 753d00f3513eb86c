//! The handler contract and a closure-based implementation.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;

use crate::context::HandlerContext;
use crate::error::HandlerError;
use crate::events::definitions::{Event, EventType};
use crate::events::effects::HandlerOutput;

/// Result of one compute call.
pub type HandlerResult = Result<HandlerOutput, HandlerError>;

/// A protocol or handler class provided by a plugin.
#[async_trait]
pub trait PluginHandler: Send + Sync + std::fmt::Debug {
    /// Event types this handler wants to receive.
    fn responds_to(&self) -> Vec<EventType>;

    /// Reacts to one event.
    async fn compute(&self, event: &Event, ctx: &HandlerContext) -> HandlerResult;
}

type BoxedFuture = Pin<Box<dyn Future<Output = HandlerResult> + Send>>;

type BoxedCompute = Arc<dyn Fn(Event, HandlerContext) -> BoxedFuture + Send + Sync>;

/// A closure-based handler for quick registration.
pub struct ClosureHandler {
    name: String,
    responds_to: Vec<EventType>,
    compute: BoxedCompute,
}

impl std::fmt::Debug for ClosureHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClosureHandler")
            .field("name", &self.name)
            .field("responds_to", &self.responds_to)
            .field("compute", &"<closure>")
            .finish()
    }
}

impl ClosureHandler {
    /// Creates a handler from an async closure.
    pub fn new<F, Fut>(name: &str, responds_to: Vec<EventType>, compute: F) -> Self
    where
        F: Fn(Event, HandlerContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        Self {
            name: name.to_string(),
            responds_to,
            compute: Arc::new(move |event: Event, ctx: HandlerContext| -> BoxedFuture {
                Box::pin(compute(event, ctx))
            }),
        }
    }

    /// Creates a handler from a synchronous closure.
    pub fn from_fn<F>(name: &str, responds_to: Vec<EventType>, compute: F) -> Self
    where
        F: Fn(&Event, &HandlerContext) -> HandlerResult + Send + Sync + 'static,
    {
        let compute = Arc::new(compute);
        Self::new(name, responds_to, move |event, ctx| {
            let compute = Arc::clone(&compute);
            async move { compute(&event, &ctx) }
        })
    }

    /// Returns the handler name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

#[async_trait]
impl PluginHandler for ClosureHandler {
    fn responds_to(&self) -> Vec<EventType> {
        self.responds_to.clone()
    }

    async fn compute(&self, event: &Event, ctx: &HandlerContext) -> HandlerResult {
        (self.compute)(event.clone(), ctx.clone()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::effects::Effect;

    #[tokio::test]
    async fn test_from_fn_reads_event_context() {
        let handler = ClosureHandler::from_fn("echo", vec![EventType::Unknown], |event, _| {
            let text = event
                .get_string("text")
                .ok_or_else(|| HandlerError::MissingContext("text".to_string()))?;
            Ok(Effect::log(text).into())
        });

        let event = Event::new(EventType::Unknown).with_context("text", serde_json::json!("hi"));
        let out = handler
            .compute(&event, &HandlerContext::default())
            .await
            .unwrap();
        assert_eq!(out.into_effects(), vec![Effect::log("hi")]);

        let err = handler
            .compute(&Event::new(EventType::Unknown), &HandlerContext::default())
            .await
            .unwrap_err();
        assert!(matches!(err, HandlerError::MissingContext(_)));
    }
}
