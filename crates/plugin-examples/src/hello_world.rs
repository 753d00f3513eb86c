//! The smallest possible protocol.

use canvas_plugin_sdk::prelude::*;

/// Logs a greeting for every `UNKNOWN` event.
#[derive(Debug, Default, Clone, Copy)]
pub struct HelloWorld;

#[async_trait]
impl PluginHandler for HelloWorld {
    fn responds_to(&self) -> Vec<EventType> {
        vec![EventType::Unknown]
    }

    async fn compute(&self, _event: &Event, _ctx: &HandlerContext) -> HandlerResult {
        Ok(Log::info("Hello, world!").apply()?.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_greets() {
        let output = HelloWorld
            .compute(&Event::new(EventType::Unknown), &HandlerContext::default())
            .await
            .unwrap();
        assert_eq!(output.into_effects(), vec![Effect::log("Hello, world!")]);
    }
}
