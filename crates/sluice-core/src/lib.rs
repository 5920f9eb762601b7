//! Sluice Core - Catalog definitions for the Sluice feature registry
//!
//! This crate provides the fundamental types shared by the registry and the
//! transformation runtime:
//! - Value types and fields
//! - Catalog objects (entities, data sources, feature views, services)
//! - Feature naming (qualified and short names, feature references)
//! - Error types

pub mod catalog;
pub mod error;
pub mod naming;
pub mod types;

// Re-export commonly used types
pub use catalog::auxiliary::{Infra, InfraObject, ProjectMetadata, SavedDataset, ValidationReference};
pub use catalog::data_source::{DataSource, DataSourceKind, FileFormat};
pub use catalog::entity::Entity;
pub use catalog::feature_service::FeatureService;
pub use catalog::feature_view::{
    BatchFeatureView, FeatureView, FeatureViewKind, MaterializationInterval, RequestFeatureView,
    StreamFeatureView,
};
pub use catalog::on_demand::{OnDemandFeatureView, TransformMode, TransformationRef};
pub use catalog::projection::{FeatureViewProjection, RequestSource};
pub use catalog::{CatalogObject, ObjectKind, ObjectMeta};
pub use error::{CoreError, Result};
pub use types::{Field, Value, ValueType};
