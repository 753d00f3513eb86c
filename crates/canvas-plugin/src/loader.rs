//! Plugin loader: turns a plugins directory into a registry snapshot.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, info, warn};

use canvas_core::config::PluginConfig;

use crate::catalog::HandlerCatalog;
use crate::context::{HandlerContext, load_secrets};
use crate::error::PluginError;
use crate::manifest::{MANIFEST_FILE, PluginManifest};
use crate::registry::{LoadedHandler, PackageStatus, PluginState, RegistrySnapshot};
use crate::sandbox::{AllowList, Sandbox};

/// Scans plugin directories, checks them, and resolves their handlers.
#[derive(Debug, Clone)]
pub struct PluginLoader {
    directory: PathBuf,
    catalog: Arc<HandlerCatalog>,
    allow_list: Arc<AllowList>,
    module_extension: String,
    environment: Arc<HashMap<String, String>>,
}

impl PluginLoader {
    /// Creates a loader with the default allow-list.
    pub fn new(directory: impl Into<PathBuf>, catalog: Arc<HandlerCatalog>) -> Self {
        Self {
            directory: directory.into(),
            catalog,
            allow_list: Arc::new(AllowList::with_defaults()),
            module_extension: "py".to_string(),
            environment: Arc::new(HashMap::new()),
        }
    }

    /// Creates a loader from configuration.
    pub fn from_config(config: &PluginConfig, catalog: Arc<HandlerCatalog>) -> Self {
        let mut allow_list = AllowList::with_defaults();
        allow_list.extend_from(&config.sandbox.extra_allowed_modules);

        Self::new(&config.directory, catalog)
            .with_allow_list(allow_list)
            .with_module_extension(&config.module_extension)
            .with_environment(config.environment.clone())
    }

    /// Replaces the allow-list.
    pub fn with_allow_list(mut self, allow_list: AllowList) -> Self {
        self.allow_list = Arc::new(allow_list);
        self
    }

    /// Sets the file extension of module sources.
    pub fn with_module_extension(mut self, extension: &str) -> Self {
        self.module_extension = extension.trim_start_matches('.').to_string();
        self
    }

    /// Sets the environment exposed to handlers.
    pub fn with_environment(mut self, environment: HashMap<String, String>) -> Self {
        self.environment = Arc::new(environment);
        self
    }

    /// The plugins directory.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// The handler catalog.
    pub fn catalog(&self) -> &HandlerCatalog {
        &self.catalog
    }

    /// Loads every plugin directory into a new snapshot.
    ///
    /// A plugin that fails any check is recorded as inactive and the pass
    /// continues. Only an unreadable plugins directory fails the whole load.
    pub fn load(&self) -> Result<RegistrySnapshot, PluginError> {
        let mut snapshot = RegistrySnapshot::empty();

        for plugin_dir in self.discover()? {
            let name = dir_name(&plugin_dir);
            let path = plugin_dir.display().to_string();

            if !plugin_dir.join(MANIFEST_FILE).is_file() {
                warn!(plugin = %name, path = %path, "Skipping directory without a manifest");
                continue;
            }

            debug!(plugin = %name, state = %PluginState::Loading, "Loading plugin");

            let handlers = self.load_package(&plugin_dir, &name).and_then(|handlers| {
                match handlers.iter().find(|h| snapshot.handlers.contains_key(&h.key)) {
                    Some(dup) => Err(PluginError::DuplicateHandler(dup.key.clone())),
                    None => Ok(handlers),
                }
            });

            match handlers {
                Ok(handlers) => {
                    info!(plugin = %name, handlers = handlers.len(), "Plugin loaded");
                    for handler in handlers {
                        for event_type in &handler.responds_to {
                            snapshot
                                .event_handlers
                                .entry(event_type.clone())
                                .or_default()
                                .push(handler.key.clone());
                        }
                        snapshot.handlers.insert(handler.key.clone(), handler);
                    }
                    snapshot.packages.push(PackageStatus {
                        name,
                        path,
                        state: PluginState::Active,
                        error: None,
                    });
                }
                Err(err) => {
                    match &err {
                        PluginError::Sandbox(sandbox_err) => match sandbox_err.location() {
                            Some((module, line)) => error!(
                                plugin = %name,
                                module = %module,
                                line,
                                error = %err,
                                "Plugin rejected by import sandbox"
                            ),
                            None => error!(plugin = %name, error = %err, "Plugin rejected by import sandbox"),
                        },
                        _ => error!(plugin = %name, error = %err, "Error during plugin load"),
                    }
                    snapshot.packages.push(PackageStatus {
                        name,
                        path,
                        state: PluginState::Inactive,
                        error: Some(err.to_string()),
                    });
                }
            }
        }

        snapshot.loaded_at = Utc::now();

        info!(
            directory = %self.directory.display(),
            packages = snapshot.packages.len(),
            active = snapshot.active_count(),
            handlers = snapshot.handlers.len(),
            "Plugin load complete"
        );

        Ok(snapshot)
    }

    /// Runs every load check on one plugin directory and returns its
    /// handlers without touching any registry.
    pub fn check_plugin(&self, plugin_dir: &Path) -> Result<Vec<LoadedHandler>, PluginError> {
        let name = dir_name(plugin_dir);
        self.load_package(plugin_dir, &name)
    }

    /// Plugin directories, sorted by name. Hidden and templated names are
    /// skipped.
    fn discover(&self) -> Result<Vec<PathBuf>, PluginError> {
        let directory_error = |source| PluginError::Directory {
            path: self.directory.display().to_string(),
            source,
        };

        let mut dirs = Vec::new();
        for entry in std::fs::read_dir(&self.directory).map_err(directory_error)? {
            let entry = entry.map_err(directory_error)?;
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            if name.starts_with('.') || name.contains("{{") {
                debug!(directory = %name, "Ignoring plugin directory");
                continue;
            }
            dirs.push(path);
        }
        dirs.sort();
        Ok(dirs)
    }

    fn load_package(&self, plugin_dir: &Path, name: &str) -> Result<Vec<LoadedHandler>, PluginError> {
        let manifest = PluginManifest::load(plugin_dir)?;
        let classes = manifest.component_classes()?;

        let mut sandbox = Sandbox::from_package(
            plugin_dir,
            &manifest.name,
            Arc::clone(&self.allow_list),
            &self.module_extension,
        )?;
        sandbox.evaluate_all(&classes)?;

        let secrets = load_secrets(plugin_dir, name, &manifest.secrets)?;
        let context = HandlerContext::new(name, secrets, Arc::clone(&self.environment));

        let mut seen = HashSet::new();
        let mut handlers = Vec::with_capacity(classes.len());

        for class_path in classes {
            let key = LoadedHandler::key_for(name, &class_path.module, &class_path.class_name);
            if !seen.insert(key.clone()) {
                return Err(PluginError::DuplicateHandler(key));
            }

            let handler = self.catalog.resolve(&class_path)?;

            let mut responds_to = Vec::new();
            for event_type in handler.responds_to() {
                let event_name = event_type.name().to_string();
                if !responds_to.contains(&event_name) {
                    responds_to.push(event_name);
                }
            }

            debug!(plugin = %name, handler = %key, events = ?responds_to, "Resolved handler");

            handlers.push(LoadedHandler {
                key,
                package_name: name.to_string(),
                module_path: class_path.module,
                class_name: class_path.class_name,
                is_active: true,
                responds_to,
                error: None,
                handler: Some(handler),
                context: context.clone(),
            });
        }

        Ok(handlers)
    }
}

fn dir_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}
