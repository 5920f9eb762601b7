//! Feature views
//!
//! The four kinds of feature view form a closed set. Each kind is stored in
//! its own registry sub-namespace and dispatch is a single `match` on
//! [`FeatureView`].

use super::data_source::{DataSource, DataSourceKind};
use super::entity::Entity;
use super::on_demand::OnDemandFeatureView;
use super::projection::{FeatureViewProjection, RequestSource};
use super::{impl_catalog_object, ObjectKind, ObjectMeta};
use crate::error::{CoreError, Result};
use crate::types::Field;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// A `(start, end)` range recorded as loaded into the online store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterializationInterval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Feature view backed by a batch data source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchFeatureView {
    pub name: String,

    /// Entity names
    #[serde(default)]
    pub entities: Vec<String>,

    /// Join key columns of the entities; excluded from `features()`
    #[serde(default)]
    pub entity_columns: Vec<String>,

    /// How long feature values stay valid after their event timestamp
    #[serde(default)]
    pub ttl: Option<Duration>,

    /// Full schema, including entity columns
    #[serde(default)]
    pub schema: Vec<Field>,

    /// Whether the view is served from the online store
    #[serde(default)]
    pub online: bool,

    pub source: DataSource,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub tags: BTreeMap<String, String>,

    #[serde(default)]
    pub owner: String,

    /// Append-only materialization log
    #[serde(default)]
    pub materialization_intervals: Vec<MaterializationInterval>,

    #[serde(default)]
    pub meta: ObjectMeta,
}

impl_catalog_object!(BatchFeatureView, ObjectKind::BatchFeatureView, validated);

impl BatchFeatureView {
    pub fn new(name: impl Into<String>, source: DataSource) -> Self {
        Self {
            name: name.into(),
            entities: Vec::new(),
            entity_columns: Vec::new(),
            ttl: None,
            schema: Vec::new(),
            online: false,
            source,
            description: String::new(),
            tags: BTreeMap::new(),
            owner: String::new(),
            materialization_intervals: Vec::new(),
            meta: ObjectMeta::default(),
        }
    }

    /// Attach an entity; its join keys become entity columns
    pub fn with_entity(mut self, entity: &Entity) -> Self {
        self.entities.push(entity.name.clone());
        self.entity_columns.extend(entity.join_keys.iter().cloned());
        self
    }

    pub fn with_schema(mut self, schema: Vec<Field>) -> Self {
        self.schema = schema;
        self
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn with_online(mut self, online: bool) -> Self {
        self.online = online;
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

    /// Schema fields that are features (entity columns excluded)
    pub fn features(&self) -> Vec<Field> {
        features_without(&self.schema, &self.entity_columns)
    }

    pub fn projection(&self) -> FeatureViewProjection {
        FeatureViewProjection::new(self.name.clone(), self.features())
    }

    pub fn validate(&self) -> Result<()> {
        require_name(&self.name)
    }
}

/// Feature view fed by a push/stream source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamFeatureView {
    pub name: String,

    #[serde(default)]
    pub entities: Vec<String>,

    #[serde(default)]
    pub entity_columns: Vec<String>,

    #[serde(default)]
    pub ttl: Option<Duration>,

    #[serde(default)]
    pub schema: Vec<Field>,

    #[serde(default)]
    pub online: bool,

    /// Must be a push source
    pub source: DataSource,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub tags: BTreeMap<String, String>,

    #[serde(default)]
    pub owner: String,

    #[serde(default)]
    pub materialization_intervals: Vec<MaterializationInterval>,

    #[serde(default)]
    pub meta: ObjectMeta,
}

impl_catalog_object!(StreamFeatureView, ObjectKind::StreamFeatureView, validated);

impl StreamFeatureView {
    pub fn new(name: impl Into<String>, source: DataSource) -> Self {
        Self {
            name: name.into(),
            entities: Vec::new(),
            entity_columns: Vec::new(),
            ttl: None,
            schema: Vec::new(),
            online: false,
            source,
            description: String::new(),
            tags: BTreeMap::new(),
            owner: String::new(),
            materialization_intervals: Vec::new(),
            meta: ObjectMeta::default(),
        }
    }

    pub fn with_entity(mut self, entity: &Entity) -> Self {
        self.entities.push(entity.name.clone());
        self.entity_columns.extend(entity.join_keys.iter().cloned());
        self
    }

    pub fn with_schema(mut self, schema: Vec<Field>) -> Self {
        self.schema = schema;
        self
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn with_online(mut self, online: bool) -> Self {
        self.online = online;
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

    pub fn features(&self) -> Vec<Field> {
        features_without(&self.schema, &self.entity_columns)
    }

    pub fn projection(&self) -> FeatureViewProjection {
        FeatureViewProjection::new(self.name.clone(), self.features())
    }

    pub fn validate(&self) -> Result<()> {
        require_name(&self.name)?;
        match self.source.kind {
            DataSourceKind::Push { .. } => Ok(()),
            _ => Err(CoreError::InvalidDefinition(format!(
                "Stream feature view '{}' must be backed by a push source, got '{}'",
                self.name, self.source.name
            ))),
        }
    }
}

/// Feature view whose fields are supplied at request time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestFeatureView {
    pub name: String,

    pub request_source: RequestSource,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub tags: BTreeMap<String, String>,

    #[serde(default)]
    pub owner: String,

    #[serde(default)]
    pub meta: ObjectMeta,
}

impl_catalog_object!(RequestFeatureView, ObjectKind::RequestFeatureView, validated);

impl RequestFeatureView {
    pub fn new(name: impl Into<String>, request_source: RequestSource) -> Self {
        Self {
            name: name.into(),
            request_source,
            description: String::new(),
            tags: BTreeMap::new(),
            owner: String::new(),
            meta: ObjectMeta::default(),
        }
    }

    pub fn features(&self) -> Vec<Field> {
        self.request_source.schema.clone()
    }

    pub fn projection(&self) -> FeatureViewProjection {
        FeatureViewProjection::new(self.name.clone(), self.features())
    }

    pub fn validate(&self) -> Result<()> {
        require_name(&self.name)?;
        if self.request_source.schema.is_empty() {
            return Err(CoreError::InvalidDefinition(format!(
                "Request feature view '{}' declares no fields",
                self.name
            )));
        }
        Ok(())
    }
}

pub(crate) fn require_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(CoreError::InvalidDefinition(
            "Feature view name cannot be empty".to_string(),
        ));
    }
    Ok(())
}

fn features_without(schema: &[Field], entity_columns: &[String]) -> Vec<Field> {
    schema
        .iter()
        .filter(|f| !entity_columns.contains(&f.name))
        .cloned()
        .collect()
}

/// Kind tag of a feature view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureViewKind {
    Batch,
    Stream,
    OnDemand,
    Request,
}

impl FeatureViewKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeatureViewKind::Batch => "batch",
            FeatureViewKind::Stream => "stream",
            FeatureViewKind::OnDemand => "on_demand",
            FeatureViewKind::Request => "request",
        }
    }

    pub fn object_kind(&self) -> ObjectKind {
        match self {
            FeatureViewKind::Batch => ObjectKind::BatchFeatureView,
            FeatureViewKind::Stream => ObjectKind::StreamFeatureView,
            FeatureViewKind::OnDemand => ObjectKind::OnDemandFeatureView,
            FeatureViewKind::Request => ObjectKind::RequestFeatureView,
        }
    }
}

impl fmt::Display for FeatureViewKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeatureViewKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "batch" => Ok(FeatureViewKind::Batch),
            "stream" => Ok(FeatureViewKind::Stream),
            "on_demand" => Ok(FeatureViewKind::OnDemand),
            "request" => Ok(FeatureViewKind::Request),
            other => Err(CoreError::UnknownObjectKind(other.to_string())),
        }
    }
}

/// Any feature view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FeatureView {
    Batch(BatchFeatureView),
    Stream(StreamFeatureView),
    OnDemand(OnDemandFeatureView),
    Request(RequestFeatureView),
}

impl FeatureView {
    pub fn name(&self) -> &str {
        match self {
            FeatureView::Batch(v) => &v.name,
            FeatureView::Stream(v) => &v.name,
            FeatureView::OnDemand(v) => &v.name,
            FeatureView::Request(v) => &v.name,
        }
    }

    pub fn kind(&self) -> FeatureViewKind {
        match self {
            FeatureView::Batch(_) => FeatureViewKind::Batch,
            FeatureView::Stream(_) => FeatureViewKind::Stream,
            FeatureView::OnDemand(_) => FeatureViewKind::OnDemand,
            FeatureView::Request(_) => FeatureViewKind::Request,
        }
    }

    pub fn meta(&self) -> &ObjectMeta {
        match self {
            FeatureView::Batch(v) => &v.meta,
            FeatureView::Stream(v) => &v.meta,
            FeatureView::OnDemand(v) => &v.meta,
            FeatureView::Request(v) => &v.meta,
        }
    }

    pub fn features(&self) -> Vec<Field> {
        match self {
            FeatureView::Batch(v) => v.features(),
            FeatureView::Stream(v) => v.features(),
            FeatureView::OnDemand(v) => v.features.clone(),
            FeatureView::Request(v) => v.features(),
        }
    }

    /// Default projection over all features of the view
    pub fn projection(&self) -> FeatureViewProjection {
        match self {
            FeatureView::Batch(v) => v.projection(),
            FeatureView::Stream(v) => v.projection(),
            FeatureView::OnDemand(v) => v.projection(),
            FeatureView::Request(v) => v.projection(),
        }
    }

    /// Kind-specific validation
    pub fn validate(&self) -> Result<()> {
        match self {
            FeatureView::Batch(v) => v.validate(),
            FeatureView::Stream(v) => v.validate(),
            FeatureView::OnDemand(v) => v.validate(),
            FeatureView::Request(v) => v.validate(),
        }
    }
}

impl From<BatchFeatureView> for FeatureView {
    fn from(v: BatchFeatureView) -> Self {
        FeatureView::Batch(v)
    }
}

impl From<StreamFeatureView> for FeatureView {
    fn from(v: StreamFeatureView) -> Self {
        FeatureView::Stream(v)
    }
}

impl From<OnDemandFeatureView> for FeatureView {
    fn from(v: OnDemandFeatureView) -> Self {
        FeatureView::OnDemand(v)
    }
}

impl From<RequestFeatureView> for FeatureView {
    fn from(v: RequestFeatureView) -> Self {
        FeatureView::Request(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ValueType;

    fn driver_view() -> BatchFeatureView {
        let driver = Entity::new("driver", "driver_id");
        BatchFeatureView::new(
            "driver_hourly_stats",
            DataSource::file("driver_hourly_stats_source", "./data/driver_stats.parquet"),
        )
        .with_entity(&driver)
        .with_schema(vec![
            Field::new("driver_id", ValueType::Int64),
            Field::new("conv_rate", ValueType::Float32),
            Field::new("acc_rate", ValueType::Float32),
        ])
        .with_online(true)
    }

    #[test]
    fn test_features_exclude_entity_columns() {
        let names: Vec<_> = driver_view()
            .features()
            .into_iter()
            .map(|f| f.name)
            .collect();
        assert_eq!(names, vec!["conv_rate", "acc_rate"]);
    }

    #[test]
    fn test_kind_parse() {
        assert_eq!("on_demand".parse::<FeatureViewKind>().unwrap(), FeatureViewKind::OnDemand);
        assert_eq!(
            "materialized".parse::<FeatureViewKind>(),
            Err(CoreError::UnknownObjectKind("materialized".to_string()))
        );
    }

    #[test]
    fn test_stream_view_requires_push_source() {
        let view: FeatureView = StreamFeatureView::new(
            "driver_stream",
            DataSource::file("driver_hourly_stats_source", "./data/driver_stats.parquet"),
        )
        .into();
        assert!(view.validate().is_err());

        let push = DataSource::push(
            "driver_push",
            DataSource::file("driver_hourly_stats_source", "./data/driver_stats.parquet"),
        );
        let view: FeatureView = StreamFeatureView::new("driver_stream", push).into();
        assert!(view.validate().is_ok());
    }

    #[test]
    fn test_feature_view_serde_tag() {
        let view: FeatureView = driver_view().into();
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["kind"], "batch");

        let back: FeatureView = serde_json::from_value(json).unwrap();
        assert_eq!(back, view);
    }
}
