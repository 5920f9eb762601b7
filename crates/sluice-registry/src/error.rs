//! Error types for the registry layer

use sluice_core::{CoreError, ObjectKind};
use thiserror::Error;

/// Result type alias for registry operations
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Errors that can occur during registry operations
#[derive(Error, Debug)]
pub enum RegistryError {
    /// An object with the same name already exists in the sub-namespace
    #[error("{kind} '{name}' already exists in project '{project}'")]
    DuplicateObject {
        kind: ObjectKind,
        name: String,
        project: String,
    },

    /// No object with this name exists in the sub-namespace
    #[error("{kind} '{name}' does not exist in project '{project}'")]
    ObjectNotFound {
        kind: ObjectKind,
        name: String,
        project: String,
    },

    /// Kind string does not name a feature view kind
    #[error("Unknown object kind: {0}")]
    UnknownObjectKind(String),

    /// The persistence backend could not be reached
    #[error("Registry backend unavailable: {0}")]
    BackendUnavailable(String),

    /// Snapshot could not be encoded or decoded
    #[error("Snapshot error: {0}")]
    Snapshot(#[from] serde_json::Error),

    /// I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid registry configuration
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// Database error (when database feature is enabled)
    #[cfg(feature = "postgres")]
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Definition rejected by the core
    #[error(transparent)]
    Core(#[from] CoreError),
}

impl RegistryError {
    pub(crate) fn duplicate(kind: ObjectKind, name: &str, project: &str) -> Self {
        RegistryError::DuplicateObject {
            kind,
            name: name.to_string(),
            project: project.to_string(),
        }
    }

    pub(crate) fn not_found(kind: ObjectKind, name: &str, project: &str) -> Self {
        RegistryError::ObjectNotFound {
            kind,
            name: name.to_string(),
            project: project.to_string(),
        }
    }

    /// Whether this is a missing-object error
    pub fn is_not_found(&self) -> bool {
        matches!(self, RegistryError::ObjectNotFound { .. })
    }
}
