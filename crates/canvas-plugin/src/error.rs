//! Plugin load and handler errors.

use thiserror::Error;

use canvas_core::error::{AppError, ErrorKind};

use crate::sandbox::SandboxError;

/// Reasons a plugin package can fail to load or a registration can fail.
#[derive(Debug, Error)]
pub enum PluginError {
    /// The plugin imports something outside its sandbox.
    #[error(transparent)]
    Sandbox(#[from] SandboxError),
    /// The manifest is missing fields, malformed, or inconsistent.
    #[error("invalid manifest for plugin '{plugin}': {reason}")]
    Manifest {
        /// Plugin directory name.
        plugin: String,
        /// What is wrong.
        reason: String,
    },
    /// A manifest component names a class no compiled-in handler provides.
    #[error("no handler registered for class '{0}'")]
    HandlerNotFound(String),
    /// A class path was registered twice in the catalog.
    #[error("handler class '{0}' is already registered")]
    DuplicateHandler(String),
    /// A class path is not of the form `package.module:ClassName`.
    #[error("invalid class path '{0}', expected 'package.module:ClassName'")]
    InvalidClassPath(String),
    /// The plugins directory itself could not be read.
    #[error("cannot read plugins directory '{path}': {source}")]
    Directory {
        /// Directory path.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// Any other I/O error while reading plugin files.
    #[error("I/O error reading '{path}': {source}")]
    Io {
        /// File path.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

impl From<PluginError> for AppError {
    fn from(err: PluginError) -> Self {
        let kind = match &err {
            PluginError::HandlerNotFound(_) => ErrorKind::NotFound,
            PluginError::DuplicateHandler(_) => ErrorKind::Conflict,
            PluginError::InvalidClassPath(_) => ErrorKind::Validation,
            _ => ErrorKind::Plugin,
        };
        AppError::with_source(kind, err.to_string(), err)
    }
}

/// Error returned by a handler's compute call.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// The handler gave up with a message.
    #[error("{0}")]
    Failed(String),
    /// A value the handler needs is absent from the event context.
    #[error("missing context value '{0}'")]
    MissingContext(String),
    /// A secret the handler needs was not configured.
    #[error("missing secret '{0}'")]
    MissingSecret(String),
    /// Building an effect payload failed.
    #[error("payload serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl HandlerError {
    /// Creates a generic failure.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}
