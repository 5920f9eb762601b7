//! Feature services

use super::feature_view::FeatureView;
use super::projection::FeatureViewProjection;
use super::{impl_catalog_object, ObjectKind, ObjectMeta};
use crate::error::{CoreError, Result};
use crate::naming;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A named, ordered list of projections served together
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureService {
    pub name: String,

    #[serde(default)]
    pub projections: Vec<FeatureViewProjection>,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub tags: BTreeMap<String, String>,

    #[serde(default)]
    pub owner: String,

    #[serde(default)]
    pub meta: ObjectMeta,
}

impl_catalog_object!(FeatureService, ObjectKind::FeatureService, validated);

impl FeatureService {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            projections: Vec::new(),
            description: String::new(),
            tags: BTreeMap::new(),
            owner: String::new(),
            meta: ObjectMeta::default(),
        }
    }

    pub fn with_projection(mut self, projection: FeatureViewProjection) -> Self {
        self.projections.push(projection);
        self
    }

    pub fn with_feature_view(self, view: &FeatureView) -> Self {
        self.with_projection(view.projection())
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = owner.into();
        self
    }

    /// `"view:feature"` references for every served feature
    pub fn feature_refs(&self) -> Vec<String> {
        self.projections
            .iter()
            .flat_map(|p| {
                p.features
                    .iter()
                    .map(move |f| naming::feature_ref(p.name_to_use(), &f.name))
            })
            .collect()
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(CoreError::InvalidDefinition(
                "Feature service name cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Field, ValueType};

    #[test]
    fn test_feature_refs_follow_projection_order() {
        let service = FeatureService::new("driver_activity_v1")
            .with_projection(FeatureViewProjection::new(
                "driver_hourly_stats",
                vec![Field::new("conv_rate", ValueType::Float32)],
            ))
            .with_projection(
                FeatureViewProjection::new(
                    "transformed_conv_rate",
                    vec![Field::new("conv_rate_plus_val1", ValueType::Float64)],
                )
                .with_alias("trc"),
            );

        assert_eq!(
            service.feature_refs(),
            vec![
                "driver_hourly_stats:conv_rate".to_string(),
                "trc:conv_rate_plus_val1".to_string(),
            ]
        );
    }
}
