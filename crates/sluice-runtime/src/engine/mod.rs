//! On-demand transformation engine
//!
//! The engine applies the transformation referenced by an on-demand feature
//! view to a batch of upstream feature values and request data:
//!
//! 1. input names are reconciled so every projected feature is addressable
//!    by its short and its qualified name,
//! 2. the registered transformation runs once per batch (`pandas` mode) or
//!    once per row (`python` mode),
//! 3. declared outputs are renamed to the requested naming convention,
//! 4. columns introduced in step 1 are dropped.
//!
//! The engine holds no per-call state and never retries.

pub mod inference;
pub mod reconcile;

use crate::error::{Result, RuntimeError};
use crate::table::{FeatureTable, Row};
use crate::transform::{TransformRegistry, Transformation};
use reconcile::{finalize_outputs, reconcile_inputs};
use sluice_core::{naming, OnDemandFeatureView};
use std::sync::Arc;
use tracing::debug;

/// Executes on-demand feature views against registered transformations
#[derive(Debug, Clone)]
pub struct OnDemandEngine {
    transforms: Arc<TransformRegistry>,
}

impl OnDemandEngine {
    pub fn new(transforms: TransformRegistry) -> Self {
        Self {
            transforms: Arc::new(transforms),
        }
    }

    /// Share a transform registry with other engines
    pub fn with_shared(transforms: Arc<TransformRegistry>) -> Self {
        Self { transforms }
    }

    pub fn transforms(&self) -> &TransformRegistry {
        &self.transforms
    }

    /// Compute the view's outputs for every row of `input`
    ///
    /// With `full_feature_names` outputs are named
    /// `"<view name_to_use>__<feature>"`, otherwise by their short name.
    pub fn transform(
        &self,
        view: &OnDemandFeatureView,
        input: &FeatureTable,
        full_feature_names: bool,
    ) -> Result<FeatureTable> {
        let transformation = self.transforms.resolve(&view.transformation)?;
        let (reconciled, introduced) = reconcile_inputs(view, input)?;

        debug!(
            "Transforming {} rows with '{}' ({} mode)",
            reconciled.num_rows(),
            view.name,
            view.mode()
        );

        let output = self.execute(view, transformation, &reconciled)?;
        finalize_outputs(
            view,
            output,
            &introduced,
            reconciled.num_rows(),
            full_feature_names,
        )
    }

    /// Compute the view's outputs for a single request row
    pub fn transform_row(
        &self,
        view: &OnDemandFeatureView,
        row: &Row,
        full_feature_names: bool,
    ) -> Result<Row> {
        let input = FeatureTable::from_rows(std::slice::from_ref(row));
        self.transform(view, &input, full_feature_names)?.row(0)
    }

    /// Apply several views to the same batch and append their declared
    /// outputs to it
    pub fn transform_many(
        &self,
        views: &[OnDemandFeatureView],
        input: &FeatureTable,
        full_feature_names: bool,
    ) -> Result<FeatureTable> {
        let mut result = input.clone();
        for view in views {
            let output = self.transform(view, input, full_feature_names)?;
            for feature in &view.features {
                let name = if full_feature_names {
                    naming::qualify(view.name_to_use(), &feature.name)
                } else {
                    feature.name.clone()
                };
                if let Some(values) = output.column(&name) {
                    result.insert_column(name, values.to_vec())?;
                }
            }
        }
        Ok(result)
    }

    /// Run the transformation on an already reconciled batch
    fn execute(
        &self,
        view: &OnDemandFeatureView,
        transformation: &Transformation,
        table: &FeatureTable,
    ) -> Result<FeatureTable> {
        match transformation {
            Transformation::Tabular(f) => {
                let output = f.call(table).map_err(|e| RuntimeError::TransformationExecution {
                    view: view.name.clone(),
                    message: e.to_string(),
                })?;
                if output.num_columns() > 0 && output.num_rows() != table.num_rows() {
                    return Err(RuntimeError::TransformationExecution {
                        view: view.name.clone(),
                        message: format!(
                            "transformation returned {} rows for a batch of {}",
                            output.num_rows(),
                            table.num_rows()
                        ),
                    });
                }
                Ok(output)
            }
            Transformation::Row(f) => {
                let mut outputs = Vec::with_capacity(table.num_rows());
                for (i, row) in table.rows().enumerate() {
                    let output = f.call(&row).map_err(|e| RuntimeError::TransformationExecution {
                        view: view.name.clone(),
                        message: format!("row {}: {}", i, e),
                    })?;
                    outputs.push(output);
                }
                Ok(FeatureTable::from_rows(&outputs))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::TransformError;
    use sluice_core::{Field, RequestSource, TransformMode, TransformationRef, Value, ValueType};

    fn echo_view(mode: TransformMode) -> OnDemandFeatureView {
        OnDemandFeatureView::new("echo", TransformationRef::new("echo", mode))
            .with_request_source(RequestSource::new(
                "request",
                vec![Field::new("val", ValueType::Int64)],
            ))
            .with_schema(vec![Field::new("val_copy", ValueType::Int64)])
    }

    #[test]
    fn test_row_mode_error_carries_view_and_row() {
        let mut transforms = TransformRegistry::new();
        transforms.register(
            "echo",
            Transformation::row(|row| match row.get("val") {
                Some(Value::Int(v)) if *v >= 0 => {
                    let mut out = Row::new();
                    out.insert("val_copy".to_string(), Value::Int(*v));
                    Ok(out)
                }
                _ => Err(TransformError::InvalidInput("val must be non-negative".into())),
            }),
        );
        let engine = OnDemandEngine::new(transforms);
        let input =
            FeatureTable::from_columns(vec![("val", vec![Value::Int(1), Value::Int(-1)])]).unwrap();

        let err = engine
            .transform(&echo_view(TransformMode::Python), &input, false)
            .unwrap_err();
        match err {
            RuntimeError::TransformationExecution { view, message } => {
                assert_eq!(view, "echo");
                assert_eq!(message, "row 1: Invalid input: val must be non-negative");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_empty_batch_row_mode() {
        let mut transforms = TransformRegistry::new();
        transforms.register(
            "echo",
            Transformation::row(|_| Err(TransformError::Failed("must not run".into()))),
        );
        let engine = OnDemandEngine::new(transforms);

        let output = engine
            .transform(&echo_view(TransformMode::Python), &FeatureTable::new(), false)
            .unwrap();
        assert_eq!(output.num_rows(), 0);
        assert!(output.contains("val_copy"));
    }

    #[test]
    fn test_mode_mismatch_is_configuration_error() {
        let mut transforms = TransformRegistry::new();
        transforms.register("echo", Transformation::tabular(|t| Ok(t.clone())));
        let engine = OnDemandEngine::new(transforms);

        let err = engine
            .transform(&echo_view(TransformMode::Python), &FeatureTable::new(), false)
            .unwrap_err();
        assert!(matches!(err, RuntimeError::Configuration(_)));
    }
}
