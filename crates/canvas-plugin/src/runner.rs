//! Plugin runner: owns the live registry and serves events and reloads.

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use futures::stream::{self, BoxStream, StreamExt};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{error, info, warn};
use uuid::Uuid;

use canvas_core::config::PluginConfig;
use canvas_core::error::AppError;
use canvas_core::result::AppResult;

use crate::catalog::HandlerCatalog;
use crate::dispatcher::{EventDispatcher, HandlerResponse};
use crate::events::definitions::Event;
use crate::loader::PluginLoader;
use crate::registry::RegistrySnapshot;
use crate::synchronizer::{SyncChannel, SyncMessage};

/// Result of a reload request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReloadPluginsResponse {
    /// Whether the new registry was installed.
    pub success: bool,
    /// Failure reason.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Holds the current [`RegistrySnapshot`] and swaps it atomically on reload.
///
/// Readers load the snapshot once per request and never block on a reload.
#[derive(Debug)]
pub struct PluginRunner {
    instance_id: Uuid,
    snapshot: ArcSwap<RegistrySnapshot>,
    loader: PluginLoader,
    dispatcher: EventDispatcher,
    reload_lock: Mutex<()>,
    sync: Option<SyncChannel>,
}

impl PluginRunner {
    /// Creates a runner with an empty registry.
    pub fn new(loader: PluginLoader, dispatcher: EventDispatcher) -> Self {
        Self {
            instance_id: Uuid::new_v4(),
            snapshot: ArcSwap::from_pointee(RegistrySnapshot::empty()),
            loader,
            dispatcher,
            reload_lock: Mutex::new(()),
            sync: None,
        }
    }

    /// Creates a runner from configuration.
    pub fn from_config(config: &PluginConfig, catalog: Arc<HandlerCatalog>) -> Self {
        Self::new(
            PluginLoader::from_config(config, catalog),
            EventDispatcher::new(Duration::from_secs(config.handler_timeout_seconds)),
        )
    }

    /// Publishes reloads on `channel`.
    pub fn with_sync_channel(mut self, channel: SyncChannel) -> Self {
        self.sync = Some(channel);
        self
    }

    /// Identifies this runner on the sync channel.
    pub fn instance_id(&self) -> Uuid {
        self.instance_id
    }

    /// The loader.
    pub fn loader(&self) -> &PluginLoader {
        &self.loader
    }

    /// The current registry.
    pub fn snapshot(&self) -> Arc<RegistrySnapshot> {
        self.snapshot.load_full()
    }

    /// Rebuilds the registry from disk and swaps it in.
    ///
    /// On failure the previous registry stays in place.
    pub async fn load_plugins(&self) -> AppResult<Arc<RegistrySnapshot>> {
        let _guard = self.reload_lock.lock().await;

        let loader = self.loader.clone();
        let loaded = tokio::task::spawn_blocking(move || loader.load())
            .await
            .map_err(|e| AppError::internal(format!("Plugin load task failed: {e}")))?;

        match loaded {
            Ok(snapshot) => {
                let snapshot = Arc::new(snapshot);
                self.snapshot.store(Arc::clone(&snapshot));
                Ok(snapshot)
            }
            Err(e) => {
                warn!(
                    directory = %self.loader.directory().display(),
                    error = %e,
                    "Plugin load failed, keeping previous registry"
                );
                Err(e.into())
            }
        }
    }

    /// Dispatches an event to every handler registered for its type.
    pub fn handle_event(&self, event: Event) -> BoxStream<'static, HandlerResponse> {
        info!(
            event_type = %event.event_type,
            target = event.target.as_deref().unwrap_or(""),
            "Handling event"
        );
        self.dispatcher.dispatch(self.snapshot(), event)
    }

    /// Reloads all plugins and tells other runners to do the same.
    ///
    /// Yields exactly one response.
    pub async fn reload_plugins(&self) -> BoxStream<'static, ReloadPluginsResponse> {
        let response = match self.load_plugins().await {
            Ok(_) => {
                if let Some(channel) = &self.sync {
                    channel.publish(SyncMessage::Reload {
                        origin: self.instance_id,
                    });
                }
                ReloadPluginsResponse {
                    success: true,
                    error: None,
                }
            }
            Err(e) => {
                error!(error = %e, "Reload failed");
                ReloadPluginsResponse {
                    success: false,
                    error: Some(e.message),
                }
            }
        };

        stream::once(async move { response }).boxed()
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::error::HandlerError;
    use crate::events::definitions::EventType;
    use crate::events::effects::Effect;
    use crate::handler::{ClosureHandler, PluginHandler};
    use crate::manifest::MANIFEST_FILE;
    use crate::registry::PluginState;

    fn write(root: &Path, rel: &str, body: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, body).unwrap();
    }

    fn plugin(root: &Path, name: &str, classes: &[&str], source: &str) {
        let protocols: Vec<serde_json::Value> = classes
            .iter()
            .map(|c| serde_json::json!({"class": format!("{name}.protocols.p:{c}")}))
            .collect();
        write(
            root,
            &format!("{name}/{MANIFEST_FILE}"),
            &serde_json::json!({"name": name, "components": {"protocols": protocols}}).to_string(),
        );
        write(root, &format!("{name}/protocols/p.py"), source);
    }

    fn catalog() -> Arc<HandlerCatalog> {
        let mut catalog = HandlerCatalog::new();
        catalog
            .register("hello.protocols.p:Protocol", || -> Arc<dyn PluginHandler> {
                Arc::new(ClosureHandler::from_fn(
                    "hello",
                    vec![EventType::Unknown],
                    |_, _| Ok(Effect::log("Hello, world!").into()),
                ))
            })
            .unwrap();
        catalog
            .register("pair.protocols.p:Failing", || -> Arc<dyn PluginHandler> {
                Arc::new(ClosureHandler::from_fn(
                    "failing",
                    vec![EventType::PatientCreated],
                    |_, _| Err(HandlerError::failed("no patient")),
                ))
            })
            .unwrap();
        catalog
            .register("pair.protocols.p:Working", || -> Arc<dyn PluginHandler> {
                Arc::new(ClosureHandler::from_fn(
                    "working",
                    vec![EventType::PatientCreated],
                    |event, _| {
                        let id = event.target.clone().unwrap_or_default();
                        Ok(Effect::log(format!("patient {id}")).into())
                    },
                ))
            })
            .unwrap();
        catalog
            .register("evil.protocols.p:Protocol", || -> Arc<dyn PluginHandler> {
                Arc::new(ClosureHandler::from_fn(
                    "evil",
                    vec![EventType::Unknown],
                    |_, _| Ok(Effect::log("should never run").into()),
                ))
            })
            .unwrap();
        Arc::new(catalog)
    }

    fn runner(dir: &Path) -> PluginRunner {
        PluginRunner::new(PluginLoader::new(dir, catalog()), EventDispatcher::default())
    }

    async fn dispatch(runner: &PluginRunner, event: Event) -> Vec<HandlerResponse> {
        runner.handle_event(event).collect().await
    }

    #[tokio::test]
    async fn test_hello_world() {
        let dir = tempfile::tempdir().unwrap();
        plugin(dir.path(), "hello", &["Protocol"], "from canvas_sdk.effects import Effect\n");

        let runner = runner(dir.path());
        runner.load_plugins().await.unwrap();

        let responses = dispatch(&runner, Event::new(EventType::Unknown)).await;
        assert_eq!(responses.len(), 1);
        assert!(responses[0].success);
        assert_eq!(responses[0].effects, vec![Effect::log("Hello, world!")]);
    }

    #[tokio::test]
    async fn test_forbidden_import_only_disables_that_plugin() {
        let dir = tempfile::tempdir().unwrap();
        plugin(dir.path(), "hello", &["Protocol"], "import json\n");
        plugin(dir.path(), "evil", &["Protocol"], "from hello.protocols.p import Protocol\n");

        let runner = runner(dir.path());
        let snapshot = runner.load_plugins().await.unwrap();

        assert_eq!(snapshot.package("evil").unwrap().state, PluginState::Inactive);
        assert_eq!(snapshot.package("hello").unwrap().state, PluginState::Active);
        assert!(snapshot
            .event_handlers()
            .values()
            .flatten()
            .all(|key| !key.starts_with("evil:")));

        let responses = dispatch(&runner, Event::new(EventType::Unknown)).await;
        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0].handler, "hello:hello.protocols.p:Protocol");
    }

    #[tokio::test]
    async fn test_event_without_handlers_yields_nothing() {
        let dir = tempfile::tempdir().unwrap();
        plugin(dir.path(), "hello", &["Protocol"], "");

        let runner = runner(dir.path());
        runner.load_plugins().await.unwrap();

        let responses = dispatch(&runner, Event::new(EventType::AppointmentCreated)).await;
        assert!(responses.is_empty());
    }

    #[tokio::test]
    async fn test_failing_handler_does_not_block_the_next() {
        let dir = tempfile::tempdir().unwrap();
        plugin(dir.path(), "pair", &["Failing", "Working"], "");

        let runner = runner(dir.path());
        runner.load_plugins().await.unwrap();

        let event = Event::new(EventType::PatientCreated).with_target("p-1", "Patient");
        let responses = dispatch(&runner, event).await;
        assert_eq!(responses.len(), 2);
        assert!(!responses[0].success);
        assert!(responses[1].success);
        assert_eq!(responses[1].effects, vec![Effect::log("patient p-1")]);
    }

    #[tokio::test]
    async fn test_reload_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        plugin(dir.path(), "hello", &["Protocol"], "");
        plugin(dir.path(), "pair", &["Failing", "Working"], "");

        let runner = runner(dir.path());
        let first = runner.load_plugins().await.unwrap();
        let second = runner.load_plugins().await.unwrap();
        assert!(first.same_contents(&second));
    }

    #[tokio::test]
    async fn test_removed_plugin_disappears_after_reload() {
        let dir = tempfile::tempdir().unwrap();
        plugin(dir.path(), "hello", &["Protocol"], "");
        plugin(dir.path(), "pair", &["Failing", "Working"], "");

        let runner = runner(dir.path());
        runner.load_plugins().await.unwrap();
        assert!(runner.snapshot().event_handlers().contains_key("PATIENT_CREATED"));

        std::fs::remove_dir_all(dir.path().join("pair")).unwrap();
        let mut responses: Vec<_> = runner.reload_plugins().await.collect().await;
        assert_eq!(responses.len(), 1);
        assert!(responses.remove(0).success);

        let snapshot = runner.snapshot();
        assert!(!snapshot.event_handlers().contains_key("PATIENT_CREATED"));
        assert!(snapshot.loaded_plugins().keys().all(|k| k.starts_with("hello:")));
    }

    #[tokio::test]
    async fn test_failed_reload_keeps_previous_registry() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("plugins");
        plugin(&dir, "hello", &["Protocol"], "");

        let runner = runner(&dir);
        runner.load_plugins().await.unwrap();

        std::fs::remove_dir_all(&dir).unwrap();
        let responses: Vec<_> = runner.reload_plugins().await.collect().await;
        assert_eq!(responses.len(), 1);
        assert!(!responses[0].success);

        let responses = dispatch(&runner, Event::new(EventType::Unknown)).await;
        assert_eq!(responses.len(), 1);
        assert!(responses[0].success);
    }

    #[tokio::test]
    async fn test_reload_publishes_on_sync_channel() {
        let dir = tempfile::tempdir().unwrap();
        plugin(dir.path(), "hello", &["Protocol"], "");

        let channel = SyncChannel::new(4);
        let mut rx = channel.subscribe();
        let runner = runner(dir.path()).with_sync_channel(channel);

        let _: Vec<_> = runner.reload_plugins().await.collect().await;
        assert_eq!(
            rx.try_recv().unwrap(),
            SyncMessage::Reload {
                origin: runner.instance_id()
            }
        );
    }

    #[tokio::test]
    async fn test_synchronizer_reloads_other_runner() {
        let dir = tempfile::tempdir().unwrap();
        plugin(dir.path(), "hello", &["Protocol"], "");

        let channel = SyncChannel::new(4);
        let leader = runner(dir.path()).with_sync_channel(channel.clone());
        let follower = Arc::new(runner(dir.path()));
        let task = crate::synchronizer::PluginSynchronizer::spawn(Arc::clone(&follower), &channel);

        let _: Vec<_> = leader.reload_plugins().await.collect().await;
        channel.publish(SyncMessage::Shutdown);
        task.await.unwrap();

        assert_eq!(follower.snapshot().active_count(), 1);
    }
}
