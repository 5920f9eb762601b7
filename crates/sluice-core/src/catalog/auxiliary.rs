//! Saved datasets, validation references, project metadata and infra

use super::{impl_catalog_object, ObjectKind, ObjectMeta};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A training dataset retrieved from the offline store and persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedDataset {
    pub name: String,

    /// `"view:feature"` references
    #[serde(default)]
    pub features: Vec<String>,

    #[serde(default)]
    pub join_keys: Vec<String>,

    #[serde(default)]
    pub full_feature_names: bool,

    /// Storage location of the persisted rows
    pub storage: String,

    #[serde(default)]
    pub min_event_timestamp: Option<DateTime<Utc>>,

    #[serde(default)]
    pub max_event_timestamp: Option<DateTime<Utc>>,

    #[serde(default)]
    pub tags: BTreeMap<String, String>,

    #[serde(default)]
    pub meta: ObjectMeta,
}

impl_catalog_object!(SavedDataset, ObjectKind::SavedDataset);

impl SavedDataset {
    pub fn new(name: impl Into<String>, storage: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            features: Vec::new(),
            join_keys: Vec::new(),
            full_feature_names: false,
            storage: storage.into(),
            min_event_timestamp: None,
            max_event_timestamp: None,
            tags: BTreeMap::new(),
            meta: ObjectMeta::default(),
        }
    }

    pub fn with_features(mut self, features: Vec<String>) -> Self {
        self.features = features;
        self
    }

    pub fn with_join_keys(mut self, join_keys: Vec<String>) -> Self {
        self.join_keys = join_keys;
        self
    }
}

/// Named pairing of a saved dataset with the profiler used to validate it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReference {
    pub name: String,

    pub dataset_name: String,

    /// Name of the profiler producing the reference profile
    #[serde(default)]
    pub profiler: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub tags: BTreeMap<String, String>,

    #[serde(default)]
    pub meta: ObjectMeta,
}

impl_catalog_object!(ValidationReference, ObjectKind::ValidationReference);

impl ValidationReference {
    pub fn new(name: impl Into<String>, dataset_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dataset_name: dataset_name.into(),
            profiler: String::new(),
            description: String::new(),
            tags: BTreeMap::new(),
            meta: ObjectMeta::default(),
        }
    }

    pub fn with_profiler(mut self, profiler: impl Into<String>) -> Self {
        self.profiler = profiler.into();
        self
    }
}

/// Per-project bookkeeping recorded on the first apply into a project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectMetadata {
    pub project_name: String,
    pub project_uuid: String,
    pub last_updated_timestamp: DateTime<Utc>,
}

/// A piece of provisioned infrastructure, e.g. an online store table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InfraObject {
    pub kind: String,
    pub name: String,
    #[serde(default)]
    pub config: serde_json::Value,
}

impl InfraObject {
    pub fn new(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            name: name.into(),
            config: serde_json::Value::Null,
        }
    }

    pub fn with_config(mut self, config: serde_json::Value) -> Self {
        self.config = config;
        self
    }
}

/// Infrastructure provisioned for a project
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Infra {
    #[serde(default)]
    pub infra_objects: Vec<InfraObject>,
}

impl Infra {
    pub fn new(infra_objects: Vec<InfraObject>) -> Self {
        Self { infra_objects }
    }

    pub fn is_empty(&self) -> bool {
        self.infra_objects.is_empty()
    }
}
