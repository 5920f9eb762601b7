//! Transformation registration
//!
//! User transformations are plain Rust functions registered by a stable name
//! at startup. Catalog definitions refer to them through
//! [`TransformationRef`]; the engine resolves the reference here before every
//! invocation.

use crate::error::{Result, RuntimeError};
use crate::table::{FeatureTable, Row};
use sluice_core::{TransformMode, TransformationRef};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::warn;

/// Error returned by a user transformation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransformError {
    #[error("Missing input: {0}")]
    MissingInput(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("{0}")]
    Failed(String),
}

/// Transformation applied once per batch
pub trait TabularFn: Send + Sync {
    fn call(&self, input: &FeatureTable) -> std::result::Result<FeatureTable, TransformError>;
}

impl<F> TabularFn for F
where
    F: Fn(&FeatureTable) -> std::result::Result<FeatureTable, TransformError> + Send + Sync,
{
    fn call(&self, input: &FeatureTable) -> std::result::Result<FeatureTable, TransformError> {
        self(input)
    }
}

/// Transformation applied once per row
pub trait RowFn: Send + Sync {
    fn call(&self, input: &Row) -> std::result::Result<Row, TransformError>;
}

impl<F> RowFn for F
where
    F: Fn(&Row) -> std::result::Result<Row, TransformError> + Send + Sync,
{
    fn call(&self, input: &Row) -> std::result::Result<Row, TransformError> {
        self(input)
    }
}

/// A registered transformation
#[derive(Clone)]
pub enum Transformation {
    /// `pandas` mode
    Tabular(Arc<dyn TabularFn>),
    /// `python` mode
    Row(Arc<dyn RowFn>),
}

impl Transformation {
    pub fn tabular<F>(f: F) -> Self
    where
        F: Fn(&FeatureTable) -> std::result::Result<FeatureTable, TransformError>
            + Send
            + Sync
            + 'static,
    {
        Transformation::Tabular(Arc::new(f))
    }

    pub fn row<F>(f: F) -> Self
    where
        F: Fn(&Row) -> std::result::Result<Row, TransformError> + Send + Sync + 'static,
    {
        Transformation::Row(Arc::new(f))
    }

    /// Mode a definition must declare to use this transformation
    pub fn mode(&self) -> TransformMode {
        match self {
            Transformation::Tabular(_) => TransformMode::Pandas,
            Transformation::Row(_) => TransformMode::Python,
        }
    }
}

impl fmt::Debug for Transformation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transformation::Tabular(_) => f.write_str("Transformation::Tabular"),
            Transformation::Row(_) => f.write_str("Transformation::Row"),
        }
    }
}

/// Registry for storing and resolving transformations by name
#[derive(Debug, Clone, Default)]
pub struct TransformRegistry {
    transforms: HashMap<String, Transformation>,
}

impl TransformRegistry {
    /// Create a new empty transform registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a transformation, replacing any previous one with the same name
    ///
    /// # Example
    ///
    /// ```
    /// use sluice_core::Value;
    /// use sluice_runtime::{Transformation, TransformError, TransformRegistry};
    ///
    /// let mut registry = TransformRegistry::new();
    /// registry.register(
    ///     "double_conv_rate",
    ///     Transformation::row(|row| {
    ///         let rate = row
    ///             .get("conv_rate")
    ///             .and_then(Value::as_f64)
    ///             .ok_or_else(|| TransformError::MissingInput("conv_rate".to_string()))?;
    ///         let mut out = row.clone();
    ///         out.insert("conv_rate_doubled".to_string(), Value::Float(rate * 2.0));
    ///         Ok(out)
    ///     }),
    /// );
    /// assert!(registry.has_transform("double_conv_rate"));
    /// ```
    pub fn register(&mut self, name: impl Into<String>, transformation: Transformation) {
        let name = name.into();
        if self.transforms.insert(name.clone(), transformation).is_some() {
            warn!("Replacing registered transformation '{}'", name);
        }
    }

    /// Look up a transformation by name
    pub fn get(&self, name: &str) -> Result<&Transformation> {
        self.transforms
            .get(name)
            .ok_or_else(|| RuntimeError::TransformNotFound(name.to_string()))
    }

    /// Resolve a catalog reference, checking that its mode matches the
    /// registered transformation's shape
    pub fn resolve(&self, reference: &TransformationRef) -> Result<&Transformation> {
        let transformation = self.get(&reference.name)?;
        if transformation.mode() != reference.mode {
            return Err(RuntimeError::Configuration(format!(
                "Transformation '{}' is registered for mode '{}' but the definition declares '{}'",
                reference.name,
                transformation.mode(),
                reference.mode
            )));
        }
        Ok(transformation)
    }

    /// Check if a transform is registered
    pub fn has_transform(&self, name: &str) -> bool {
        self.transforms.contains_key(name)
    }

    /// Names of all registered transformations, sorted
    pub fn list_transforms(&self) -> Vec<String> {
        let mut names: Vec<String> = self.transforms.keys().cloned().collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity_registry() -> TransformRegistry {
        let mut registry = TransformRegistry::new();
        registry.register("tabular_identity", Transformation::tabular(|t| Ok(t.clone())));
        registry.register("row_identity", Transformation::row(|r| Ok(r.clone())));
        registry
    }

    #[test]
    fn test_register_and_list() {
        let registry = identity_registry();
        assert_eq!(
            registry.list_transforms(),
            vec!["row_identity".to_string(), "tabular_identity".to_string()]
        );
    }

    #[test]
    fn test_resolve_checks_mode() {
        let registry = identity_registry();

        let ok = TransformationRef::new("row_identity", TransformMode::Python);
        assert!(registry.resolve(&ok).is_ok());

        let mismatched = TransformationRef::new("row_identity", TransformMode::Pandas);
        assert!(matches!(
            registry.resolve(&mismatched),
            Err(RuntimeError::Configuration(_))
        ));
    }

    #[test]
    fn test_resolve_unknown_name() {
        let registry = identity_registry();
        let missing = TransformationRef::new("missing", TransformMode::Pandas);
        assert!(matches!(
            registry.resolve(&missing),
            Err(RuntimeError::TransformNotFound(name)) if name == "missing"
        ));
    }

    #[test]
    fn test_transform_error_display() {
        assert_eq!(
            TransformError::MissingInput("conv_rate".into()).to_string(),
            "Missing input: conv_rate"
        );
    }
}
