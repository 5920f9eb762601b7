//! Sluice Runtime - On-demand feature transformation engine
//!
//! This crate executes on-demand feature views at serving time:
//! - Transformation registration by stable name
//! - Tabular and row execution modes with naming reconciliation
//! - Output schema inference
//! - Resolution of requested feature references
//! - Data source connectors

pub mod connector;
pub mod engine;
pub mod error;
pub mod requested;
pub mod table;
pub mod transform;

// Re-export main types
pub use connector::{DataSourceConnector, InMemoryConnector, MaterializationWindow, TableHandle};
pub use engine::OnDemandEngine;
pub use error::{Result, RuntimeError};
pub use requested::requested_on_demand_feature_views;
pub use table::{FeatureTable, Row};
pub use transform::{RowFn, TabularFn, TransformError, TransformRegistry, Transformation};
