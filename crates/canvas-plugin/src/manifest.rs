//! `CANVAS_MANIFEST.json` parsing and class path handling.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::PluginError;

/// File every plugin directory must contain.
pub const MANIFEST_FILE: &str = "CANVAS_MANIFEST.json";

/// A `package.module.path:ClassName` reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClassPath {
    /// Dotted module path.
    pub module: String,
    /// Class name inside the module.
    pub class_name: String,
}

impl ClassPath {
    /// Parses `package.module:ClassName`.
    pub fn parse(raw: &str) -> Result<Self, PluginError> {
        let (module, class_name) = raw
            .split_once(':')
            .ok_or_else(|| PluginError::InvalidClassPath(raw.to_string()))?;

        let valid_module = !module.is_empty()
            && module
                .split('.')
                .all(|part| !part.is_empty() && is_identifier(part));
        if !valid_module || !is_identifier(class_name) {
            return Err(PluginError::InvalidClassPath(raw.to_string()));
        }

        Ok(Self {
            module: module.to_string(),
            class_name: class_name.to_string(),
        })
    }

    /// First segment of the module path, i.e. the owning package.
    pub fn package(&self) -> &str {
        self.module.split('.').next().unwrap_or(&self.module)
    }
}

impl std::fmt::Display for ClassPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.module, self.class_name)
    }
}

pub(crate) fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c == '_' || c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
}

/// A handler or protocol entry under `components`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentEntry {
    /// Class path of the handler.
    #[serde(rename = "class")]
    pub class: String,
    /// Free-text description.
    #[serde(default)]
    pub description: String,
}

/// The `components` section. Sections the runner does not act on
/// (`commands`, `content`, `views`...) are ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Components {
    /// Event-driven protocols.
    #[serde(default)]
    pub protocols: Vec<ComponentEntry>,
    /// Event-driven handlers.
    #[serde(default)]
    pub handlers: Vec<ComponentEntry>,
}

/// Parsed plugin manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginManifest {
    /// Package name; must match the directory name.
    pub name: String,
    /// SDK version the plugin was built against.
    #[serde(default)]
    pub sdk_version: Option<String>,
    /// Plugin release version.
    #[serde(default)]
    pub plugin_version: Option<String>,
    /// Free-text description.
    #[serde(default)]
    pub description: String,
    /// Declared handler classes.
    #[serde(default)]
    pub components: Components,
    /// Names of secrets the plugin may read.
    #[serde(default)]
    pub secrets: Vec<String>,
}

impl PluginManifest {
    /// Reads and validates the manifest inside `plugin_dir`.
    pub fn load(plugin_dir: &Path) -> Result<Self, PluginError> {
        let dir_name = plugin_dir
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let path = plugin_dir.join(MANIFEST_FILE);

        let raw = std::fs::read_to_string(&path).map_err(|source| PluginError::Io {
            path: path.display().to_string(),
            source,
        })?;

        let manifest: Self = serde_json::from_str(&raw).map_err(|e| PluginError::Manifest {
            plugin: dir_name.clone(),
            reason: e.to_string(),
        })?;

        manifest.validate(&dir_name)?;
        Ok(manifest)
    }

    /// Checks the name and that every component lives in this package.
    pub fn validate(&self, dir_name: &str) -> Result<(), PluginError> {
        let invalid = |reason: String| PluginError::Manifest {
            plugin: dir_name.to_string(),
            reason,
        };

        if !is_identifier(&self.name) {
            return Err(invalid(format!("'{}' is not a valid package name", self.name)));
        }
        if self.name != dir_name {
            return Err(invalid(format!(
                "name '{}' does not match directory '{}'",
                self.name, dir_name
            )));
        }

        for class_path in self.component_classes()? {
            if class_path.package() != self.name {
                return Err(invalid(format!(
                    "component '{}' is outside package '{}'",
                    class_path, self.name
                )));
            }
        }

        Ok(())
    }

    /// All component class paths in registration order: protocols first,
    /// then handlers.
    pub fn component_classes(&self) -> Result<Vec<ClassPath>, PluginError> {
        self.components
            .protocols
            .iter()
            .chain(self.components.handlers.iter())
            .map(|entry| ClassPath::parse(&entry.class))
            .collect()
    }
}
