//! Resolution of requested feature references to on-demand views

use crate::error::{Result, RuntimeError};
use sluice_core::{naming, OnDemandFeatureView};
use sluice_registry::Registry;
use tracing::debug;

/// On-demand views that must run to serve `feature_refs`
///
/// References have the form `"view:feature"`, where `view` is either a view's
/// name or its alias. Every returned view keeps only the
/// requested outputs, in view declaration order, and views are returned in
/// the order they are first referenced. References to other view kinds are
/// ignored.
pub fn requested_on_demand_feature_views(
    registry: &Registry,
    project: &str,
    feature_refs: &[&str],
) -> Result<Vec<OnDemandFeatureView>> {
    let available = registry.list_on_demand_feature_views(project);
    let mut requested: Vec<(OnDemandFeatureView, Vec<String>)> = Vec::new();

    for reference in feature_refs {
        let (view_name, feature) = naming::parse_feature_ref(reference)?;
        let Some(view) = available
            .iter()
            .find(|v| v.name == view_name || v.name_to_use() == view_name)
        else {
            continue;
        };
        if !view.features.iter().any(|f| f.name == feature) {
            return Err(RuntimeError::Configuration(format!(
                "Feature '{}' is not an output of on-demand feature view '{}'",
                feature, view_name
            )));
        }

        match requested.iter_mut().find(|(v, _)| v.name == view.name) {
            Some((_, features)) => {
                if !features.iter().any(|f| f == feature) {
                    features.push(feature.to_string());
                }
            }
            None => requested.push((view.clone(), vec![feature.to_string()])),
        }
    }

    debug!(
        "Resolved {} feature references to {} on-demand views in '{}'",
        feature_refs.len(),
        requested.len(),
        project
    );

    Ok(requested
        .into_iter()
        .map(|(mut view, features)| {
            view.features.retain(|f| features.contains(&f.name));
            view
        })
        .collect())
}
