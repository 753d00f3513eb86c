//! Import sandbox for plugin packages.
//!
//! Before any handler of a plugin is registered, every module named by the
//! manifest is scanned, along with everything it pulls in from its own
//! package. Each dependency edge must stay inside the package or land on
//! the [`AllowList`]. A single bad edge rejects the whole plugin.

pub mod allow_list;
pub mod scanner;

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::manifest::{ClassPath, is_identifier};

pub use allow_list::AllowList;
use scanner::{ImportStatement, scan_imports};

/// An import that the sandbox refuses.
#[derive(Debug, Error)]
pub enum SandboxError {
    /// A module outside the package and the allow-list.
    #[error("'{module}' is not an allowed import.")]
    ForbiddenImport {
        /// The imported module.
        module: String,
        /// Module containing the import.
        importer: String,
        /// Line of the import.
        line: usize,
    },
    /// An allow-listed module, but a name it does not expose.
    #[error("'{name}' is not an allowed import from '{module}'.")]
    ForbiddenName {
        /// The imported name.
        name: String,
        /// The module it was imported from.
        module: String,
        /// Module containing the import.
        importer: String,
        /// Line of the import.
        line: usize,
    },
    /// A package-local module that does not exist.
    #[error("Could not load module \"{0}\"")]
    ModuleNotFound(String),
    /// A relative import that climbs out of the package.
    #[error("relative import beyond top-level package in '{importer}' (line {line})")]
    RelativeBeyondPackage {
        /// Module containing the import.
        importer: String,
        /// Line of the import.
        line: usize,
    },
    /// A `__import__(...)` call.
    #[error("'__import__' is not allowed (module '{importer}', line {line})")]
    DynamicImport {
        /// Module containing the call.
        importer: String,
        /// Line of the call.
        line: usize,
    },
    /// A module file could not be read.
    #[error("cannot read module '{path}': {source}")]
    Io {
        /// File path.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

impl SandboxError {
    /// Importing module and line, for errors raised by a specific statement.
    pub fn location(&self) -> Option<(&str, usize)> {
        match self {
            Self::ForbiddenImport { importer, line, .. }
            | Self::ForbiddenName { importer, line, .. }
            | Self::RelativeBeyondPackage { importer, line }
            | Self::DynamicImport { importer, line } => Some((importer.as_str(), *line)),
            Self::ModuleNotFound(_) | Self::Io { .. } => None,
        }
    }
}

#[derive(Debug, Clone)]
struct ModuleFile {
    path: PathBuf,
    is_package: bool,
}

/// Import checker for one plugin package.
///
/// Each module is evaluated at most once per sandbox.
#[derive(Debug)]
pub struct Sandbox {
    package: String,
    modules: HashMap<String, ModuleFile>,
    allow_list: Arc<AllowList>,
    evaluated: HashSet<String>,
}

impl Sandbox {
    /// Indexes every module file under `plugin_dir` as part of `package`.
    ///
    /// `a/b.py` becomes `package.a.b`, `a/__init__.py` becomes `package.a`.
    pub fn from_package(
        plugin_dir: &Path,
        package: &str,
        allow_list: Arc<AllowList>,
        extension: &str,
    ) -> Result<Self, SandboxError> {
        let mut modules = HashMap::new();
        index_modules(plugin_dir, package, extension, &mut modules)?;

        debug!(package = %package, modules = modules.len(), "Indexed plugin modules");

        Ok(Self {
            package: package.to_string(),
            modules,
            allow_list,
            evaluated: HashSet::new(),
        })
    }

    /// Package name this sandbox confines.
    pub fn package(&self) -> &str {
        &self.package
    }

    /// Whether the package contains `module`.
    pub fn contains(&self, module: &str) -> bool {
        self.modules.contains_key(module)
    }

    /// Evaluates the modules behind every class path.
    pub fn evaluate_all(&mut self, classes: &[ClassPath]) -> Result<(), SandboxError> {
        for class_path in classes {
            self.evaluate(&class_path.module)?;
        }
        Ok(())
    }

    /// Checks `module` and everything it imports from the package.
    pub fn evaluate(&mut self, module: &str) -> Result<(), SandboxError> {
        if self.evaluated.contains(module) {
            return Ok(());
        }
        let file = self
            .modules
            .get(module)
            .cloned()
            .ok_or_else(|| SandboxError::ModuleNotFound(module.to_string()))?;
        self.evaluated.insert(module.to_string());

        // Importing `pkg.a.b` runs `pkg/__init__` and `pkg/a/__init__` first.
        let parts: Vec<&str> = module.split('.').collect();
        for depth in 1..parts.len() {
            let parent = parts[..depth].join(".");
            if self.modules.contains_key(&parent) {
                self.evaluate(&parent)?;
            }
        }

        let source = std::fs::read_to_string(&file.path).map_err(|source| SandboxError::Io {
            path: file.path.display().to_string(),
            source,
        })?;

        for import in scan_imports(&source) {
            let line = import.line;
            match import.statement {
                ImportStatement::Dynamic => {
                    return Err(SandboxError::DynamicImport {
                        importer: module.to_string(),
                        line,
                    });
                }
                ImportStatement::Import { module: target } => {
                    if self.is_local(&target) {
                        self.evaluate_local(&target)?;
                    } else if !self.allow_list.is_allowed_module(&target) {
                        return Err(SandboxError::ForbiddenImport {
                            module: target,
                            importer: module.to_string(),
                            line,
                        });
                    }
                }
                ImportStatement::From {
                    level,
                    module: from,
                    names,
                } => {
                    let target = if level == 0 {
                        from.unwrap_or_default()
                    } else {
                        resolve_relative(module, file.is_package, level, from.as_deref())
                            .ok_or_else(|| SandboxError::RelativeBeyondPackage {
                                importer: module.to_string(),
                                line,
                            })?
                    };
                    self.check_from(module, line, &target, &names)?;
                }
            }
        }

        Ok(())
    }

    fn is_local(&self, module: &str) -> bool {
        module.split('.').next() == Some(self.package.as_str())
    }

    /// Evaluates a package-local module. Directories without an `__init__`
    /// count as namespace packages.
    fn evaluate_local(&mut self, module: &str) -> Result<(), SandboxError> {
        if self.modules.contains_key(module) {
            return self.evaluate(module);
        }
        let prefix = format!("{module}.");
        if self.modules.keys().any(|m| m.starts_with(&prefix)) {
            return Ok(());
        }
        Err(SandboxError::ModuleNotFound(module.to_string()))
    }

    fn check_from(
        &mut self,
        importer: &str,
        line: usize,
        target: &str,
        names: &[String],
    ) -> Result<(), SandboxError> {
        if self.is_local(target) {
            for name in names {
                let submodule = format!("{target}.{name}");
                if self.modules.contains_key(&submodule) {
                    self.evaluate(&submodule)?;
                } else {
                    self.evaluate_local(target)?;
                }
            }
            if names.is_empty() {
                self.evaluate_local(target)?;
            }
            return Ok(());
        }

        for name in names {
            if self.allow_list.is_allowed_name(target, name)
                || self.allow_list.is_allowed_module(&format!("{target}.{name}"))
            {
                continue;
            }
            if self.allow_list.is_allowed_module(target) {
                return Err(SandboxError::ForbiddenName {
                    name: name.clone(),
                    module: target.to_string(),
                    importer: importer.to_string(),
                    line,
                });
            }
            return Err(SandboxError::ForbiddenImport {
                module: target.to_string(),
                importer: importer.to_string(),
                line,
            });
        }

        Ok(())
    }
}

/// Resolves `from <dots><module> import ...` inside `importer`.
///
/// Returns `None` when the dots climb above the top-level package.
fn resolve_relative(
    importer: &str,
    importer_is_package: bool,
    level: usize,
    module: Option<&str>,
) -> Option<String> {
    let mut base: Vec<&str> = importer.split('.').collect();
    if !importer_is_package {
        base.pop();
    }
    for _ in 1..level {
        if base.len() <= 1 {
            return None;
        }
        base.pop();
    }
    if base.is_empty() {
        return None;
    }

    let mut resolved = base.join(".");
    if let Some(module) = module {
        resolved.push('.');
        resolved.push_str(module);
    }
    Some(resolved)
}

fn index_modules(
    dir: &Path,
    prefix: &str,
    extension: &str,
    modules: &mut HashMap<String, ModuleFile>,
) -> Result<(), SandboxError> {
    let entries = std::fs::read_dir(dir).map_err(|source| SandboxError::Io {
        path: dir.display().to_string(),
        source,
    })?;

    for entry in entries {
        let entry = entry.map_err(|source| SandboxError::Io {
            path: dir.display().to_string(),
            source,
        })?;
        let path = entry.path();
        let Some(stem) = path.file_stem().map(|s| s.to_string_lossy().to_string()) else {
            continue;
        };

        if path.is_dir() {
            let name = entry.file_name().to_string_lossy().to_string();
            if is_identifier(&name) {
                index_modules(&path, &format!("{prefix}.{name}"), extension, modules)?;
            }
            continue;
        }

        let matches_extension = path
            .extension()
            .is_some_and(|ext| ext.to_string_lossy() == extension);
        if !matches_extension {
            continue;
        }

        if stem == "__init__" {
            modules.insert(
                prefix.to_string(),
                ModuleFile {
                    path,
                    is_package: true,
                },
            );
        } else if is_identifier(&stem) {
            modules.insert(
                format!("{prefix}.{stem}"),
                ModuleFile {
                    path,
                    is_package: false,
                },
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(root: &Path, rel: &str, body: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, body).unwrap();
    }

    fn sandbox(root: &Path) -> Sandbox {
        Sandbox::from_package(root, "demo", Arc::new(AllowList::with_defaults()), "py").unwrap()
    }

    #[test]
    fn test_indexes_modules_and_packages() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "__init__.py", "");
        write(dir.path(), "protocols/__init__.py", "");
        write(dir.path(), "protocols/my_protocol.py", "");
        write(dir.path(), "README.md", "import os");

        let sandbox = sandbox(dir.path());
        assert!(sandbox.contains("demo"));
        assert!(sandbox.contains("demo.protocols"));
        assert!(sandbox.contains("demo.protocols.my_protocol"));
        assert!(!sandbox.contains("demo.README"));
    }

    #[test]
    fn test_allowed_and_package_imports_pass() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "protocols/my_protocol.py",
            "from canvas_sdk.effects import Effect, EffectType\nimport json\nfrom datetime import timedelta\nfrom demo.utils import helper\nfrom ..utils import helper\n",
        );
        write(dir.path(), "utils.py", "from typing import Any\n");

        let mut sandbox = sandbox(dir.path());
        sandbox.evaluate("demo.protocols.my_protocol").unwrap();
    }

    #[test]
    fn test_forbidden_module_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "handler.py", "import json\nimport os\n");

        let err = sandbox(dir.path()).evaluate("demo.handler").unwrap_err();
        assert_eq!(err.to_string(), "'os' is not an allowed import.");
        assert_eq!(err.location(), Some(("demo.handler", 2)));
    }

    #[test]
    fn test_forbidden_module_hidden_in_one_line_forms_is_rejected() {
        for source in [
            "x = 1; import json, os\n",
            "if True: import json, os\n",
            "import\tjson, os\n",
            "class A: import os\n",
        ] {
            let dir = tempfile::tempdir().unwrap();
            write(dir.path(), "handler.py", source);

            let err = sandbox(dir.path()).evaluate("demo.handler").unwrap_err();
            assert_eq!(err.to_string(), "'os' is not an allowed import.", "{source:?}");
        }
    }

    #[test]
    fn test_forbidden_name_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "handler.py", "from json import JSONDecoder\n");

        let err = sandbox(dir.path()).evaluate("demo.handler").unwrap_err();
        assert_eq!(
            err.to_string(),
            "'JSONDecoder' is not an allowed import from 'json'."
        );
    }

    #[test]
    fn test_violation_in_imported_package_module_is_found() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "handler.py", "from demo import helpers\n");
        write(dir.path(), "helpers.py", "def f():\n    import subprocess\n");

        let err = sandbox(dir.path()).evaluate("demo.handler").unwrap_err();
        assert!(matches!(
            err,
            SandboxError::ForbiddenImport { ref module, ref importer, .. }
                if module == "subprocess" && importer == "demo.helpers"
        ));
    }

    #[test]
    fn test_parent_init_is_evaluated() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "protocols/__init__.py", "import socket\n");
        write(dir.path(), "protocols/p.py", "");

        let err = sandbox(dir.path()).evaluate("demo.protocols.p").unwrap_err();
        assert_eq!(err.to_string(), "'socket' is not an allowed import.");
    }

    #[test]
    fn test_other_plugin_package_is_forbidden() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "handler.py", "from other_plugin.secrets import KEY\n");

        let err = sandbox(dir.path()).evaluate("demo.handler").unwrap_err();
        assert_eq!(err.to_string(), "'other_plugin.secrets' is not an allowed import.");
    }

    #[test]
    fn test_relative_import_beyond_package() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "handler.py", "from .. import elsewhere\n");

        let err = sandbox(dir.path()).evaluate("demo.handler").unwrap_err();
        assert!(matches!(err, SandboxError::RelativeBeyondPackage { .. }));
    }

    #[test]
    fn test_missing_module_and_dynamic_import() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "handler.py", "m = __import__(name)\n");

        let mut sandbox = sandbox(dir.path());
        let err = sandbox.evaluate("demo.missing").unwrap_err();
        assert_eq!(err.to_string(), "Could not load module \"demo.missing\"");

        let err = sandbox.evaluate("demo.handler").unwrap_err();
        assert!(matches!(err, SandboxError::DynamicImport { line: 1, .. }));
    }

    #[test]
    fn test_cyclic_imports_terminate() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.py", "from demo import b\n");
        write(dir.path(), "b.py", "from demo import a\n");

        sandbox(dir.path()).evaluate("demo.a").unwrap();
    }

    #[test]
    fn test_resolve_relative() {
        assert_eq!(
            resolve_relative("demo.protocols.p", false, 1, None).as_deref(),
            Some("demo.protocols")
        );
        assert_eq!(
            resolve_relative("demo.protocols.p", false, 2, Some("utils")).as_deref(),
            Some("demo.utils")
        );
        assert_eq!(
            resolve_relative("demo.protocols", true, 1, Some("p")).as_deref(),
            Some("demo.protocols.p")
        );
        assert_eq!(resolve_relative("demo.p", false, 2, None), None);
    }
}
