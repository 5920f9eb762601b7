//! Output schema inference
//!
//! The transformation is invoked once on a synthetic single-row batch built
//! from representative values of the declared input types. The columns it
//! returns become the inferred schema.

use super::reconcile::reconcile_inputs;
use super::OnDemandEngine;
use crate::error::{Result, RuntimeError};
use crate::table::FeatureTable;
use sluice_core::{Field, OnDemandFeatureView};
use tracing::debug;

impl OnDemandEngine {
    /// Infer the output schema of `view`
    ///
    /// Every output column counts as a feature except the qualified input
    /// names added during reconciliation, so an input field the
    /// transformation returns (rewritten or not) is inferred too.
    ///
    /// Without a declared schema the inferred one is adopted. With one, every
    /// declared feature must appear in the inferred set with a compatible
    /// type, and the declaration is kept.
    pub fn infer_schema(&self, view: &OnDemandFeatureView) -> Result<OnDemandFeatureView> {
        let transformation = self.transforms.resolve(&view.transformation)?;
        let input = synthetic_input(view)?;
        let (reconciled, introduced) = reconcile_inputs(view, &input)?;
        let output = self.execute(view, transformation, &reconciled)?;

        let inferred: Vec<Field> = output
            .column_types()
            .into_iter()
            .filter(|(name, _)| !introduced.contains(name))
            .map(|(name, dtype)| Field::new(name, dtype))
            .collect();

        if inferred.is_empty() {
            return Err(RuntimeError::SchemaInference {
                view: view.name.clone(),
                message: "transformation produced no output columns".to_string(),
            });
        }

        let mut view = view.clone();
        if view.features.is_empty() {
            debug!("Inferred {} features for '{}'", inferred.len(), view.name);
            view.features = inferred;
            return Ok(view);
        }

        let missing: Vec<String> = view
            .features
            .iter()
            .filter(|declared| {
                !inferred
                    .iter()
                    .any(|f| f.name == declared.name && declared.dtype.accepts(&f.dtype))
            })
            .map(|f| format!("{}: {}", f.name, f.dtype))
            .collect();

        if !missing.is_empty() {
            let found: Vec<String> = inferred
                .iter()
                .map(|f| format!("{}: {}", f.name, f.dtype))
                .collect();
            return Err(RuntimeError::SchemaInference {
                view: view.name.clone(),
                message: format!(
                    "declared features [{}] not present in inferred features [{}]",
                    missing.join(", "),
                    found.join(", ")
                ),
            });
        }

        Ok(view)
    }
}

/// One row holding a sample value for every declared input
fn synthetic_input(view: &OnDemandFeatureView) -> Result<FeatureTable> {
    let mut table = FeatureTable::new();
    for projection in view.source_feature_view_projections.values() {
        for feature in &projection.features {
            table.insert_column(feature.name.clone(), vec![feature.dtype.sample_value()])?;
        }
    }
    for source in view.source_request_sources.values() {
        for field in &source.schema {
            table.insert_column(field.name.clone(), vec![field.dtype.sample_value()])?;
        }
    }
    Ok(table)
}
