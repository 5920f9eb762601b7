//! Resident catalog state
//!
//! Each object kind lives in its own [`Namespace`], a map of
//! `project -> name -> object`. Ordered maps keep listings sorted by name and
//! give the snapshot a deterministic encoding.

use serde::{Deserialize, Serialize};
use sluice_core::{
    BatchFeatureView, CatalogObject, DataSource, Entity, FeatureService, Infra,
    OnDemandFeatureView, ProjectMetadata, RequestFeatureView, SavedDataset, StreamFeatureView,
    ValidationReference,
};
use std::collections::BTreeMap;

/// Project-scoped storage for one object kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Namespace<T> {
    projects: BTreeMap<String, BTreeMap<String, T>>,
}

impl<T> Default for Namespace<T> {
    fn default() -> Self {
        Self {
            projects: BTreeMap::new(),
        }
    }
}

impl<T> Namespace<T> {
    pub fn get(&self, project: &str, name: &str) -> Option<&T> {
        self.projects.get(project)?.get(name)
    }

    pub fn get_mut(&mut self, project: &str, name: &str) -> Option<&mut T> {
        self.projects.get_mut(project)?.get_mut(name)
    }

    pub fn contains(&self, project: &str, name: &str) -> bool {
        self.get(project, name).is_some()
    }

    pub fn insert(&mut self, project: &str, name: String, value: T) -> Option<T> {
        self.projects
            .entry(project.to_string())
            .or_default()
            .insert(name, value)
    }

    pub fn remove(&mut self, project: &str, name: &str) -> Option<T> {
        let objects = self.projects.get_mut(project)?;
        let removed = objects.remove(name);
        if objects.is_empty() {
            self.projects.remove(project);
        }
        removed
    }

    /// Objects of `project`, ordered by name
    pub fn iter(&self, project: &str) -> impl Iterator<Item = &T> {
        self.projects
            .get(project)
            .into_iter()
            .flat_map(|objects| objects.values())
    }

    pub fn projects(&self) -> impl Iterator<Item = &str> {
        self.projects.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.projects.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }
}

/// Every catalog object kind, keyed by project
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Catalog {
    pub entities: Namespace<Entity>,
    pub data_sources: Namespace<DataSource>,
    pub feature_services: Namespace<FeatureService>,
    pub batch_feature_views: Namespace<BatchFeatureView>,
    pub stream_feature_views: Namespace<StreamFeatureView>,
    pub on_demand_feature_views: Namespace<OnDemandFeatureView>,
    pub request_feature_views: Namespace<RequestFeatureView>,
    pub saved_datasets: Namespace<SavedDataset>,
    pub validation_references: Namespace<ValidationReference>,
    pub project_metadata: BTreeMap<String, ProjectMetadata>,
    pub infra: BTreeMap<String, Infra>,
    /// project -> feature view name -> opaque bytes
    pub user_metadata: BTreeMap<String, BTreeMap<String, Vec<u8>>>,
}

/// A catalog object with a home namespace in [`Catalog`]
pub trait Catalogued: CatalogObject {
    fn namespace(catalog: &Catalog) -> &Namespace<Self>;

    fn namespace_mut(catalog: &mut Catalog) -> &mut Namespace<Self>;
}

macro_rules! catalogued {
    ($ty:ty, $field:ident) => {
        impl Catalogued for $ty {
            fn namespace(catalog: &Catalog) -> &Namespace<Self> {
                &catalog.$field
            }

            fn namespace_mut(catalog: &mut Catalog) -> &mut Namespace<Self> {
                &mut catalog.$field
            }
        }
    };
}

catalogued!(Entity, entities);
catalogued!(DataSource, data_sources);
catalogued!(FeatureService, feature_services);
catalogued!(BatchFeatureView, batch_feature_views);
catalogued!(StreamFeatureView, stream_feature_views);
catalogued!(OnDemandFeatureView, on_demand_feature_views);
catalogued!(RequestFeatureView, request_feature_views);
catalogued!(SavedDataset, saved_datasets);
catalogued!(ValidationReference, validation_references);

impl Catalog {
    /// Number of stored objects across kinds and projects
    pub fn object_count(&self) -> usize {
        self.entities.len()
            + self.data_sources.len()
            + self.feature_services.len()
            + self.batch_feature_views.len()
            + self.stream_feature_views.len()
            + self.on_demand_feature_views.len()
            + self.request_feature_views.len()
            + self.saved_datasets.len()
            + self.validation_references.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespace_scopes_projects() {
        let mut ns = Namespace::default();
        ns.insert("a", "driver".to_string(), 1);
        ns.insert("b", "driver".to_string(), 2);
        ns.insert("a", "customer".to_string(), 3);

        let a: Vec<_> = ns.iter("a").copied().collect();
        assert_eq!(a, vec![3, 1]);
        assert_eq!(ns.get("b", "driver"), Some(&2));
        assert_eq!(ns.iter("c").count(), 0);
        assert_eq!(ns.len(), 3);
    }

    #[test]
    fn test_remove_drops_empty_projects() {
        let mut ns = Namespace::default();
        ns.insert("a", "driver".to_string(), 1);
        assert_eq!(ns.remove("a", "driver"), Some(1));
        assert!(ns.is_empty());
        assert_eq!(ns.remove("a", "driver"), None);
    }

    #[test]
    fn test_catalog_json_shape() {
        let mut catalog = Catalog::default();
        catalog
            .entities
            .insert("demo", "driver".to_string(), Entity::new("driver", "driver_id"));

        let json = serde_json::to_value(&catalog).unwrap();
        assert_eq!(json["entities"]["demo"]["driver"]["join_keys"][0], "driver_id");

        let back: Catalog = serde_json::from_value(json).unwrap();
        assert_eq!(back, catalog);
    }
}
