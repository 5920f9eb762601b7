//! Catalog object definitions
//!
//! Every object the registry stores implements [`CatalogObject`], which gives
//! the registry uniform access to the object's name and its server-set
//! timestamps.

pub mod auxiliary;
pub mod data_source;
pub mod entity;
pub mod feature_service;
pub mod feature_view;
pub mod on_demand;
pub mod projection;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of a catalog object; each kind is its own sub-namespace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    Entity,
    DataSource,
    FeatureService,
    BatchFeatureView,
    StreamFeatureView,
    OnDemandFeatureView,
    RequestFeatureView,
    SavedDataset,
    ValidationReference,
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ObjectKind::Entity => "entity",
            ObjectKind::DataSource => "data source",
            ObjectKind::FeatureService => "feature service",
            ObjectKind::BatchFeatureView => "feature view",
            ObjectKind::StreamFeatureView => "stream feature view",
            ObjectKind::OnDemandFeatureView => "on demand feature view",
            ObjectKind::RequestFeatureView => "request feature view",
            ObjectKind::SavedDataset => "saved dataset",
            ObjectKind::ValidationReference => "validation reference",
        };
        f.write_str(name)
    }
}

/// Server-set timestamps of a catalog object
///
/// Timestamps never participate in equality: two definitions that differ only
/// in when they were applied compare equal.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObjectMeta {
    #[serde(default)]
    pub created_timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_updated_timestamp: Option<DateTime<Utc>>,
}

impl PartialEq for ObjectMeta {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

impl ObjectMeta {
    /// Record a mutation at `now`.
    ///
    /// `created_timestamp` is only set if it was never set before;
    /// `last_updated_timestamp` never moves backwards.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        if self.created_timestamp.is_none() {
            self.created_timestamp = Some(now);
        }
        self.last_updated_timestamp = Some(match self.last_updated_timestamp {
            Some(previous) if previous > now => previous,
            _ => now,
        });
    }
}

/// An object stored in the registry
pub trait CatalogObject: Clone {
    /// Sub-namespace this object lives in
    const KIND: ObjectKind;

    /// Name, unique within `(project, KIND)`
    fn name(&self) -> &str;

    fn meta(&self) -> &ObjectMeta;

    fn meta_mut(&mut self) -> &mut ObjectMeta;

    /// Check the definition before it is stored
    fn validate(&self) -> crate::error::Result<()> {
        Ok(())
    }
}

macro_rules! impl_catalog_object {
    ($ty:ty, $kind:expr) => {
        impl $crate::catalog::CatalogObject for $ty {
            const KIND: $crate::catalog::ObjectKind = $kind;

            fn name(&self) -> &str {
                &self.name
            }

            fn meta(&self) -> &$crate::catalog::ObjectMeta {
                &self.meta
            }

            fn meta_mut(&mut self) -> &mut $crate::catalog::ObjectMeta {
                &mut self.meta
            }
        }
    };
    ($ty:ty, $kind:expr, validated) => {
        impl $crate::catalog::CatalogObject for $ty {
            const KIND: $crate::catalog::ObjectKind = $kind;

            fn name(&self) -> &str {
                &self.name
            }

            fn meta(&self) -> &$crate::catalog::ObjectMeta {
                &self.meta
            }

            fn meta_mut(&mut self) -> &mut $crate::catalog::ObjectMeta {
                &mut self.meta
            }

            fn validate(&self) -> $crate::error::Result<()> {
                <$ty>::validate(self)
            }
        }
    };
}

pub(crate) use impl_catalog_object;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_touch_sets_created_once() {
        let mut meta = ObjectMeta::default();
        let first = Utc::now();
        meta.touch(first);
        meta.touch(first + Duration::seconds(5));

        assert_eq!(meta.created_timestamp, Some(first));
        assert_eq!(meta.last_updated_timestamp, Some(first + Duration::seconds(5)));
    }

    #[test]
    fn test_touch_never_moves_backwards() {
        let mut meta = ObjectMeta::default();
        let now = Utc::now();
        meta.touch(now);
        meta.touch(now - Duration::seconds(30));

        assert_eq!(meta.last_updated_timestamp, Some(now));
    }

    #[test]
    fn test_meta_ignored_in_equality() {
        let mut a = ObjectMeta::default();
        a.touch(Utc::now());
        assert_eq!(a, ObjectMeta::default());
    }
}
