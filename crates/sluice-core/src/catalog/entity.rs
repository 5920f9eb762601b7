//! Entities: named join keys

use super::{impl_catalog_object, ObjectKind, ObjectMeta};
use crate::error::{CoreError, Result};
use crate::types::ValueType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A named join key used to look up feature values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Entity name (unique within a project)
    pub name: String,

    /// Join key column names
    pub join_keys: Vec<String>,

    /// Type of the join key values
    #[serde(default = "default_join_key_type")]
    pub value_type: ValueType,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub tags: BTreeMap<String, String>,

    #[serde(default)]
    pub owner: String,

    #[serde(default)]
    pub meta: ObjectMeta,
}

fn default_join_key_type() -> ValueType {
    ValueType::Int64
}

impl_catalog_object!(Entity, ObjectKind::Entity, validated);

impl Entity {
    /// Create an entity with a single join key
    pub fn new(name: impl Into<String>, join_key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            join_keys: vec![join_key.into()],
            value_type: default_join_key_type(),
            description: String::new(),
            tags: BTreeMap::new(),
            owner: String::new(),
            meta: ObjectMeta::default(),
        }
    }

    /// Replace the join keys
    pub fn with_join_keys(mut self, join_keys: Vec<String>) -> Self {
        self.join_keys = join_keys;
        self
    }

    pub fn with_value_type(mut self, value_type: ValueType) -> Self {
        self.value_type = value_type;
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

    /// Primary join key
    pub fn join_key(&self) -> &str {
        self.join_keys.first().map(String::as_str).unwrap_or(&self.name)
    }

    /// Validate the entity definition
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(CoreError::InvalidDefinition(
                "Entity name cannot be empty".to_string(),
            ));
        }
        if self.join_keys.is_empty() || self.join_keys.iter().any(String::is_empty) {
            return Err(CoreError::InvalidDefinition(format!(
                "Entity '{}' must declare at least one non-empty join key",
                self.name
            )));
        }
        Ok(())
    }
}
