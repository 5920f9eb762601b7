//! Runtime error types

use sluice_core::CoreError;
use sluice_registry::RegistryError;
use thiserror::Error;

/// Runtime error
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Output schema could not be inferred or does not match the declaration
    #[error("Schema inference failed for '{view}': {message}")]
    SchemaInference { view: String, message: String },

    /// A user transformation failed
    #[error("Transformation of '{view}' failed: {message}")]
    TransformationExecution { view: String, message: String },

    /// No transformation registered under this name
    #[error("Transformation not registered: {0}")]
    TransformNotFound(String),

    /// Definition and registered transformation disagree
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Data source connector failure
    #[error("Connector error: {0}")]
    Connector(String),

    /// Columns of different lengths or an out-of-range row
    #[error("Invalid feature table: {0}")]
    InvalidTable(String),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Result type for runtime operations
pub type Result<T> = std::result::Result<T, RuntimeError>;
