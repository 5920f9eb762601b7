//! On-demand feature views
//!
//! An on-demand view declares its inputs (projections of other views and
//! request sources), its output schema, and a reference to a transformation
//! registered in the runtime under a stable name.

use super::feature_view::{require_name, FeatureView};
use super::projection::{FeatureViewProjection, RequestSource};
use super::{impl_catalog_object, ObjectKind, ObjectMeta};
use crate::error::{CoreError, Result};
use crate::types::{Field, ValueType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// How a transformation consumes its input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TransformMode {
    /// One invocation per row
    Python,
    /// One invocation per batch
    #[default]
    Pandas,
}

impl TransformMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransformMode::Python => "python",
            TransformMode::Pandas => "pandas",
        }
    }

    pub fn is_row(&self) -> bool {
        matches!(self, TransformMode::Python)
    }
}

impl fmt::Display for TransformMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransformMode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "python" => Ok(TransformMode::Python),
            "pandas" => Ok(TransformMode::Pandas),
            other => Err(CoreError::Configuration(format!(
                "Unknown transformation mode '{}', expected 'python' or 'pandas'",
                other
            ))),
        }
    }
}

/// Reference to a transformation registered by name
///
/// `body_text` is informational source text and does not take part in
/// equality; two references are the same transformation when name and mode
/// agree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformationRef {
    pub name: String,

    #[serde(default)]
    pub body_text: String,

    #[serde(default)]
    pub mode: TransformMode,
}

impl TransformationRef {
    pub fn new(name: impl Into<String>, mode: TransformMode) -> Self {
        Self {
            name: name.into(),
            body_text: String::new(),
            mode,
        }
    }

    pub fn with_body_text(mut self, body_text: impl Into<String>) -> Self {
        self.body_text = body_text.into();
        self
    }
}

impl PartialEq for TransformationRef {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.mode == other.mode
    }
}

/// A feature view computed at serving time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OnDemandFeatureView {
    pub name: String,

    /// Alias used when qualifying this view's outputs
    #[serde(default)]
    pub name_alias: Option<String>,

    /// Declared output schema, in order; empty until inferred
    #[serde(default)]
    pub features: Vec<Field>,

    /// Upstream projections keyed by projection name
    #[serde(default)]
    pub source_feature_view_projections: BTreeMap<String, FeatureViewProjection>,

    /// Request sources keyed by source name
    #[serde(default)]
    pub source_request_sources: BTreeMap<String, RequestSource>,

    pub transformation: TransformationRef,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub tags: BTreeMap<String, String>,

    #[serde(default)]
    pub owner: String,

    #[serde(default)]
    pub meta: ObjectMeta,
}

impl_catalog_object!(OnDemandFeatureView, ObjectKind::OnDemandFeatureView, validated);

impl OnDemandFeatureView {
    pub fn new(name: impl Into<String>, transformation: TransformationRef) -> Self {
        Self {
            name: name.into(),
            name_alias: None,
            features: Vec::new(),
            source_feature_view_projections: BTreeMap::new(),
            source_request_sources: BTreeMap::new(),
            transformation,
            description: String::new(),
            tags: BTreeMap::new(),
            owner: String::new(),
            meta: ObjectMeta::default(),
        }
    }

    /// Add an upstream projection
    pub fn with_projection(mut self, projection: FeatureViewProjection) -> Self {
        self.source_feature_view_projections
            .insert(projection.name.clone(), projection);
        self
    }

    /// Add every feature of an upstream view as input
    pub fn with_feature_view(self, view: &FeatureView) -> Self {
        self.with_projection(view.projection())
    }

    pub fn with_request_source(mut self, source: RequestSource) -> Self {
        self.source_request_sources.insert(source.name.clone(), source);
        self
    }

    pub fn with_schema(mut self, features: Vec<Field>) -> Self {
        self.features = features;
        self
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.name_alias = Some(alias.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = owner.into();
        self
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    pub fn name_to_use(&self) -> &str {
        self.name_alias.as_deref().unwrap_or(&self.name)
    }

    pub fn projection(&self) -> FeatureViewProjection {
        let projection = FeatureViewProjection::new(self.name.clone(), self.features.clone());
        match &self.name_alias {
            Some(alias) => projection.with_alias(alias.clone()),
            None => projection,
        }
    }

    pub fn mode(&self) -> TransformMode {
        self.transformation.mode
    }

    /// All request fields across request sources; later sources win on clashes
    pub fn request_data_schema(&self) -> BTreeMap<String, ValueType> {
        let mut schema = BTreeMap::new();
        for source in self.source_request_sources.values() {
            schema.extend(source.schema_types());
        }
        schema
    }

    pub fn validate(&self) -> Result<()> {
        require_name(&self.name)?;
        if self.source_feature_view_projections.is_empty() && self.source_request_sources.is_empty() {
            return Err(CoreError::InvalidDefinition(format!(
                "On demand feature view '{}' needs at least one source",
                self.name
            )));
        }
        if self.transformation.name.is_empty() {
            return Err(CoreError::InvalidDefinition(format!(
                "On demand feature view '{}' has no transformation",
                self.name
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vals_to_add() -> RequestSource {
        RequestSource::new(
            "vals_to_add",
            vec![
                Field::new("val_to_add", ValueType::Int64),
                Field::new("val_to_add_2", ValueType::Int64),
            ],
        )
    }

    fn conv_rate_plus_val() -> OnDemandFeatureView {
        OnDemandFeatureView::new(
            "transformed_conv_rate",
            TransformationRef::new("transformed_conv_rate", TransformMode::Pandas)
                .with_body_text("df['conv_rate_plus_val1'] = df['conv_rate'] + df['val_to_add']"),
        )
        .with_request_source(vals_to_add())
        .with_schema(vec![Field::new("conv_rate_plus_val1", ValueType::Float64)])
    }

    #[test]
    fn test_mode_parse() {
        assert_eq!("python".parse::<TransformMode>().unwrap(), TransformMode::Python);
        assert_eq!("pandas".parse::<TransformMode>().unwrap(), TransformMode::Pandas);
        assert!(matches!(
            "substrait".parse::<TransformMode>(),
            Err(CoreError::Configuration(_))
        ));
    }

    #[test]
    fn test_body_text_ignored_in_equality() {
        let a = conv_rate_plus_val();
        let mut b = conv_rate_plus_val();
        b.transformation.body_text = "  df['conv_rate_plus_val1'] =\n df['conv_rate'] + df['val_to_add']".into();
        assert_eq!(a, b);
    }

    #[test]
    fn test_transformation_identity_matters() {
        let a = conv_rate_plus_val();
        let mut b = conv_rate_plus_val();
        b.transformation.name = "other".into();
        assert_ne!(a, b);

        let mut c = conv_rate_plus_val();
        c.transformation.mode = TransformMode::Python;
        assert_ne!(a, c);
    }

    #[test]
    fn test_request_data_schema() {
        let schema = conv_rate_plus_val().request_data_schema();
        assert_eq!(schema.len(), 2);
        assert_eq!(schema["val_to_add"], ValueType::Int64);
    }

    #[test]
    fn test_validate_requires_source() {
        let view = OnDemandFeatureView::new(
            "empty",
            TransformationRef::new("empty", TransformMode::Python),
        );
        assert!(view.validate().is_err());
        assert!(conv_rate_plus_val().validate().is_ok());
    }

    #[test]
    fn test_projection_uses_alias() {
        let view = conv_rate_plus_val().with_alias("rates");
        assert_eq!(view.projection().name_to_use(), "rates");
        assert_eq!(view.name_to_use(), "rates");
    }
}
