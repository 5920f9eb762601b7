//! Projections and request sources: the inputs of on-demand transformations

use crate::error::{CoreError, Result};
use crate::naming;
use crate::types::{find_field, Field, ValueType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A named subset of another feature view's features
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureViewProjection {
    /// Name of the projected feature view
    pub name: String,

    /// Alias used when qualifying output names
    #[serde(default)]
    pub name_alias: Option<String>,

    /// Projected features, in declaration order
    pub features: Vec<Field>,
}

impl FeatureViewProjection {
    pub fn new(name: impl Into<String>, features: Vec<Field>) -> Self {
        Self {
            name: name.into(),
            name_alias: None,
            features,
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.name_alias = Some(alias.into());
        self
    }

    /// Name used to qualify features of this projection
    pub fn name_to_use(&self) -> &str {
        self.name_alias.as_deref().unwrap_or(&self.name)
    }

    /// Narrow the projection to the named features, keeping their order as given
    pub fn select(mut self, names: &[&str]) -> Result<Self> {
        let mut selected = Vec::with_capacity(names.len());
        for name in names {
            let field = find_field(&self.features, name).ok_or_else(|| {
                CoreError::InvalidDefinition(format!(
                    "Feature '{}' is not part of feature view '{}'",
                    name, self.name
                ))
            })?;
            selected.push(field.clone());
        }
        self.features = selected;
        Ok(self)
    }

    /// Fully-qualified input names `"<view>__<feature>"` for every projected feature
    pub fn qualified_names(&self) -> Vec<String> {
        self.features
            .iter()
            .map(|f| naming::qualify(&self.name, &f.name))
            .collect()
    }
}

/// Fields supplied by the caller at query time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestSource {
    pub name: String,

    /// Request fields, in declaration order
    pub schema: Vec<Field>,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub tags: BTreeMap<String, String>,

    #[serde(default)]
    pub owner: String,
}

impl RequestSource {
    pub fn new(name: impl Into<String>, schema: Vec<Field>) -> Self {
        Self {
            name: name.into(),
            schema,
            description: String::new(),
            tags: BTreeMap::new(),
            owner: String::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Field name -> declared type
    pub fn schema_types(&self) -> BTreeMap<String, ValueType> {
        self.schema
            .iter()
            .map(|f| (f.name.clone(), f.dtype.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn driver_projection() -> FeatureViewProjection {
        FeatureViewProjection::new(
            "driver_hourly_stats",
            vec![
                Field::new("conv_rate", ValueType::Float32),
                Field::new("acc_rate", ValueType::Float32),
                Field::new("avg_daily_trips", ValueType::Int64),
            ],
        )
    }

    #[test]
    fn test_name_to_use_prefers_alias() {
        let projection = driver_projection();
        assert_eq!(projection.name_to_use(), "driver_hourly_stats");
        assert_eq!(projection.with_alias("stats").name_to_use(), "stats");
    }

    #[test]
    fn test_select_subset() {
        let projection = driver_projection().select(&["avg_daily_trips", "conv_rate"]).unwrap();
        let names: Vec<_> = projection.features.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["avg_daily_trips", "conv_rate"]);
    }

    #[test]
    fn test_select_unknown_feature() {
        assert!(driver_projection().select(&["missing"]).is_err());
    }

    #[test]
    fn test_qualified_names() {
        let projection = driver_projection().select(&["conv_rate"]).unwrap();
        assert_eq!(
            projection.qualified_names(),
            vec!["driver_hourly_stats__conv_rate".to_string()]
        );
    }
}
