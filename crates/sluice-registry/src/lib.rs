//! Feature registry for Sluice
//!
//! This crate provides the authoritative, project-scoped catalog of feature
//! definitions and a pluggable persistence layer for it.
//!
//! # Features
//!
//! - **Project namespaces**: every object kind has its own name space per project
//! - **Owned reads**: every read returns a copy independent of registry state
//! - **Snapshots**: the whole catalog persists as one versioned JSON document
//! - **Backends**: in-memory, single file, and PostgreSQL (feature `postgres`)
//! - **Caching**: TTL-based refresh of the resident catalog
//!
//! # Quick Start
//!
//! ```no_run
//! use sluice_core::{BatchFeatureView, DataSource, Entity, Field, ValueType};
//! use sluice_registry::{Registry, RegistryConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut registry = Registry::from_config(RegistryConfig::file("data/registry.json")).await?;
//!
//!     let driver = Entity::new("driver", "driver_id");
//!     let stats = BatchFeatureView::new(
//!         "driver_hourly_stats",
//!         DataSource::file("driver_hourly_stats_source", "data/driver_stats.parquet"),
//!     )
//!     .with_entity(&driver)
//!     .with_schema(vec![Field::new("conv_rate", ValueType::Float32)]);
//!
//!     registry.apply_entity(driver, "feast_demo")?;
//!     registry.apply_feature_view(stats, "feast_demo")?;
//!     registry.commit().await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────┐
//! │        Application Layer               │
//! │  (Runtime, feature server)             │
//! └──────────────┬─────────────────────────┘
//!                │ Registry
//!                ↓
//! ┌────────────────────────────────────────┐
//! │    Resident Catalog                    │
//! │  - per-kind project namespaces         │
//! │  - materialization log                 │
//! │  - project metadata / infra            │
//! └──────────────┬─────────────────────────┘
//!                │ RegistryStore (snapshot bytes)
//!       ┌────────┼─────────────┐
//!       ↓        ↓             ↓
//! ┌─────────┐ ┌──────────┐ ┌──────────────┐
//! │ Memory  │ │ File     │ │ PostgreSQL   │
//! │         │ │ - rename │ │ - versioned  │
//! └─────────┘ └──────────┘ └──────────────┘
//! ```

pub mod catalog;
pub mod config;
pub mod error;
pub mod file_system;
pub mod memory;
pub mod models;
pub mod registry;
pub mod snapshot;
pub mod traits;

#[cfg(feature = "postgres")]
pub mod postgres;

// Re-exports - Configuration
pub use config::{ConfigError, RegistryBackend, RegistryConfig};

// Re-exports - Error
pub use error::{RegistryError, RegistryResult};

// Re-exports - Registry
pub use catalog::{Catalog, Catalogued, Namespace};
pub use models::RegistryStats;
pub use registry::Registry;
pub use snapshot::Snapshot;
pub use traits::RegistryStore;

// Re-exports - Backends
pub use file_system::FileRegistryStore;
pub use memory::MemoryRegistryStore;

#[cfg(feature = "postgres")]
pub use postgres::PostgresRegistryStore;
