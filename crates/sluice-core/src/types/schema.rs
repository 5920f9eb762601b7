//! Field definitions for feature schemas
//!
//! A schema is an ordered list of typed fields; order is preserved end to end
//! so that inferred and declared schemas read the same way.

use super::value::ValueType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A named, typed field in a feature view or request source schema
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Field {
    /// Field name
    pub name: String,

    /// Declared value type
    pub dtype: ValueType,

    /// Optional description
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,

    /// Arbitrary metadata
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,
}

impl Field {
    /// Create a new field
    pub fn new(name: impl Into<String>, dtype: ValueType) -> Self {
        Self {
            name: name.into(),
            dtype,
            description: String::new(),
            tags: BTreeMap::new(),
        }
    }

    /// Set description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Add a tag
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }
}

/// Find a field by name in an ordered schema
pub fn find_field<'a>(schema: &'a [Field], name: &str) -> Option<&'a Field> {
    schema.iter().find(|f| f.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_builder() {
        let field = Field::new("conv_rate", ValueType::Float32)
            .with_description("conversion rate")
            .with_tag("team", "drivers");

        assert_eq!(field.name, "conv_rate");
        assert_eq!(field.dtype, ValueType::Float32);
        assert_eq!(field.tags.get("team"), Some(&"drivers".to_string()));
    }

    #[test]
    fn test_find_field() {
        let schema = vec![
            Field::new("driver_id", ValueType::Int64),
            Field::new("conv_rate", ValueType::Float32),
        ];

        assert!(find_field(&schema, "conv_rate").is_some());
        assert!(find_field(&schema, "acc_rate").is_none());
    }
}
