//! Reload fan-out between runner instances.
//!
//! A reload request on one runner is published on a broadcast channel; every
//! synchronizer subscribed to it reloads its own runner.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::runner::PluginRunner;

/// Message carried on the sync channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum SyncMessage {
    /// Reload all plugins from disk.
    Reload {
        /// Runner that already reloaded and published the message.
        origin: Uuid,
    },
    /// Stop listening.
    Shutdown,
}

/// Broadcast channel for [`SyncMessage`]s.
#[derive(Debug, Clone)]
pub struct SyncChannel {
    sender: broadcast::Sender<SyncMessage>,
}

impl SyncChannel {
    /// Creates a channel buffering up to `capacity` messages per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publishes a message. Returns how many subscribers received it.
    pub fn publish(&self, message: SyncMessage) -> usize {
        match self.sender.send(message) {
            Ok(receivers) => receivers,
            Err(_) => {
                debug!("No subscribers on sync channel");
                0
            }
        }
    }

    /// Subscribes to future messages.
    pub fn subscribe(&self) -> broadcast::Receiver<SyncMessage> {
        self.sender.subscribe()
    }
}

/// Background task that reloads a runner on sync messages.
#[derive(Debug)]
pub struct PluginSynchronizer;

impl PluginSynchronizer {
    /// Starts listening. The task ends on [`SyncMessage::Shutdown`] or when
    /// every sender is dropped.
    pub fn spawn(runner: Arc<PluginRunner>, channel: &SyncChannel) -> JoinHandle<()> {
        let mut receiver = channel.subscribe();

        tokio::spawn(async move {
            info!(runner = %runner.instance_id(), "Plugin synchronizer started");

            loop {
                match receiver.recv().await {
                    Ok(SyncMessage::Reload { origin }) if origin == runner.instance_id() => {
                        debug!("Ignoring reload published by this runner");
                    }
                    Ok(SyncMessage::Reload { origin }) => {
                        info!(origin = %origin, "Reloading plugins");
                        reload(&runner).await;
                    }
                    Ok(SyncMessage::Shutdown) => {
                        info!("Plugin synchronizer shutting down");
                        break;
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Sync channel lagged, reloading to catch up");
                        reload(&runner).await;
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        debug!("Sync channel closed");
                        break;
                    }
                }
            }
        })
    }
}

async fn reload(runner: &PluginRunner) {
    match runner.load_plugins().await {
        Ok(snapshot) => info!(
            packages = snapshot.packages.len(),
            handlers = snapshot.handlers.len(),
            "Plugins reloaded"
        ),
        Err(e) => error!(error = %e, "Plugin reload failed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_wire_shape() {
        let origin = Uuid::nil();
        let json = serde_json::to_value(SyncMessage::Reload { origin }).unwrap();
        assert_eq!(json["action"], "reload");

        let parsed: SyncMessage = serde_json::from_str(r#"{"action":"shutdown"}"#).unwrap();
        assert_eq!(parsed, SyncMessage::Shutdown);
    }

    #[test]
    fn test_publish_without_subscribers() {
        let channel = SyncChannel::new(4);
        assert_eq!(channel.publish(SyncMessage::Shutdown), 0);

        let mut rx = channel.subscribe();
        assert_eq!(channel.publish(SyncMessage::Shutdown), 1);
        assert_eq!(rx.try_recv().unwrap(), SyncMessage::Shutdown);
    }
}
