//! Naming reconciliation between short and qualified feature names
//!
//! Upstream features reach a transformation under either their short name
//! (`conv_rate`) or their qualified name (`driver_hourly_stats__conv_rate`),
//! depending on how the caller retrieved them. Before invocation both forms
//! are made present; after invocation declared outputs are renamed to the
//! requested convention and the helper columns are dropped again.

use crate::error::{Result, RuntimeError};
use crate::table::FeatureTable;
use sluice_core::{naming, OnDemandFeatureView, Value};
use std::collections::BTreeSet;

/// Columns added by [`reconcile_inputs`]
pub type Introduced = BTreeSet<String>;

/// Make every projected input feature addressable by both names
///
/// If the qualified name is present its values are copied to the short name;
/// otherwise an existing short name is copied to the qualified name. Request
/// fields are left untouched. Running this on its own output changes nothing.
pub fn reconcile_inputs(
    view: &OnDemandFeatureView,
    input: &FeatureTable,
) -> Result<(FeatureTable, Introduced)> {
    let mut table = input.clone();
    let mut introduced = Introduced::new();

    for projection in view.source_feature_view_projections.values() {
        for feature in &projection.features {
            let full = naming::qualify(&projection.name, &feature.name);
            let short = feature.name.as_str();

            if let Some(values) = table.column(&full).map(<[Value]>::to_vec) {
                if !table.contains(short) {
                    introduced.insert(short.to_string());
                }
                table.insert_column(short, values)?;
            } else if let Some(values) = table.column(short).map(<[Value]>::to_vec) {
                introduced.insert(full.clone());
                table.insert_column(full, values)?;
            }
        }
    }

    Ok((table, introduced))
}

/// Rename declared outputs to the requested convention and drop helper columns
///
/// A declared output may come back from the transformation under its short
/// name or qualified with the view's `name_to_use()`; either is accepted. A
/// missing output is an error unless the input batch had no rows
/// (`input_rows == 0`), in which case an empty column is added.
pub fn finalize_outputs(
    view: &OnDemandFeatureView,
    mut output: FeatureTable,
    introduced: &Introduced,
    input_rows: usize,
    full_feature_names: bool,
) -> Result<FeatureTable> {
    let mut targets = BTreeSet::new();

    for feature in &view.features {
        let short = feature.name.clone();
        let full = naming::qualify(view.name_to_use(), &feature.name);
        let (target, other) = if full_feature_names {
            (full, short)
        } else {
            (short, full)
        };

        if !output.contains(&target) {
            if output.contains(&other) {
                output.rename_column(&other, &target);
            } else if input_rows == 0 {
                output.insert_column(target.clone(), Vec::new())?;
            } else {
                return Err(RuntimeError::TransformationExecution {
                    view: view.name.clone(),
                    message: format!("declared output '{}' was not produced", feature.name),
                });
            }
        }
        targets.insert(target);
    }

    for column in introduced {
        if !targets.contains(column) {
            output.remove_column(column);
        }
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sluice_core::{
        Field, FeatureViewProjection, RequestSource, TransformMode, TransformationRef, ValueType,
    };

    fn view() -> OnDemandFeatureView {
        OnDemandFeatureView::new(
            "transformed_conv_rate",
            TransformationRef::new("transformed_conv_rate", TransformMode::Pandas),
        )
        .with_projection(FeatureViewProjection::new(
            "driver_hourly_stats",
            vec![Field::new("conv_rate", ValueType::Float32)],
        ))
        .with_request_source(RequestSource::new(
            "vals_to_add",
            vec![Field::new("val_to_add", ValueType::Int64)],
        ))
        .with_schema(vec![Field::new("conv_rate_plus_val1", ValueType::Float64)])
    }

    fn names(table: &FeatureTable) -> BTreeSet<String> {
        table.column_names().map(str::to_string).collect()
    }

    #[test]
    fn test_full_name_copied_to_short() {
        let input = FeatureTable::from_columns(vec![
            ("driver_hourly_stats__conv_rate", vec![Value::Float(0.5)]),
            ("val_to_add", vec![Value::Int(1)]),
        ])
        .unwrap();

        let (table, introduced) = reconcile_inputs(&view(), &input).unwrap();
        assert_eq!(table.value("conv_rate", 0), Some(&Value::Float(0.5)));
        assert_eq!(introduced, BTreeSet::from(["conv_rate".to_string()]));
        assert!(!table.contains("vals_to_add__val_to_add"));
    }

    #[test]
    fn test_short_name_copied_to_full() {
        let input = FeatureTable::from_columns(vec![("conv_rate", vec![Value::Float(0.5)])]).unwrap();

        let (table, introduced) = reconcile_inputs(&view(), &input).unwrap();
        assert_eq!(
            table.value("driver_hourly_stats__conv_rate", 0),
            Some(&Value::Float(0.5))
        );
        assert_eq!(
            introduced,
            BTreeSet::from(["driver_hourly_stats__conv_rate".to_string()])
        );
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        let input = FeatureTable::from_columns(vec![("conv_rate", vec![Value::Float(0.5)])]).unwrap();
        let (once, _) = reconcile_inputs(&view(), &input).unwrap();
        let (twice, introduced_again) = reconcile_inputs(&view(), &once).unwrap();

        assert_eq!(names(&once), names(&twice));
        assert_eq!(once, twice);
        assert!(introduced_again.is_empty());
    }

    #[test]
    fn test_finalize_renames_and_cleans_up() {
        let output = FeatureTable::from_columns(vec![
            ("conv_rate_plus_val1", vec![Value::Float(1.5)]),
            ("driver_hourly_stats__conv_rate", vec![Value::Float(0.5)]),
        ])
        .unwrap();
        let introduced = BTreeSet::from(["driver_hourly_stats__conv_rate".to_string()]);

        let table = finalize_outputs(&view(), output, &introduced, 1, true).unwrap();
        assert_eq!(
            names(&table),
            BTreeSet::from(["transformed_conv_rate__conv_rate_plus_val1".to_string()])
        );
    }

    #[test]
    fn test_finalize_missing_output() {
        let output = FeatureTable::from_columns(vec![("other", vec![Value::Int(1)])]).unwrap();
        let err = finalize_outputs(&view(), output, &Introduced::new(), 1, false).unwrap_err();
        assert!(matches!(err, RuntimeError::TransformationExecution { .. }));
    }

    #[test]
    fn test_finalize_empty_output_for_rows_fails() {
        let err = finalize_outputs(&view(), FeatureTable::new(), &Introduced::new(), 3, false)
            .unwrap_err();
        assert!(matches!(err, RuntimeError::TransformationExecution { .. }));
    }

    #[test]
    fn test_finalize_empty_batch_adds_columns() {
        let table = finalize_outputs(&view(), FeatureTable::new(), &Introduced::new(), 0, false).unwrap();
        assert!(table.contains("conv_rate_plus_val1"));
        assert_eq!(table.num_rows(), 0);
    }
}
