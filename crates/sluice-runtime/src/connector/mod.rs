//! Data source connectors
//!
//! A connector turns a [`DataSource`] descriptor into a named, queryable
//! handle over the rows it holds. Feature names in the handle already have
//! the source's `field_mapping` applied.

mod memory;

pub use memory::InMemoryConnector;

use crate::error::Result;
use crate::table::FeatureTable;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sluice_core::{DataSource, ValueType};

/// Event-time window `[start, end)` used to restrict a read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterializationWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl MaterializationWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        self.start <= ts && ts < self.end
    }
}

/// Named temporary view over the rows of a source
#[derive(Debug, Clone, PartialEq)]
pub struct TableHandle {
    pub name: String,
    pub table: FeatureTable,
}

impl TableHandle {
    pub(crate) fn temporary(table: FeatureTable) -> Self {
        Self {
            name: format!("sluice_tmp_{}", uuid::Uuid::new_v4().simple()),
            table,
        }
    }
}

/// Read access to the tables behind data sources
///
/// Failures are reported as [`RuntimeError::Connector`](crate::RuntimeError::Connector)
/// and are never retried by callers.
#[async_trait::async_trait]
pub trait DataSourceConnector: Send + Sync {
    /// Handle over the source's rows, restricted to `window` when given
    async fn table_handle(
        &self,
        source: &DataSource,
        window: Option<MaterializationWindow>,
    ) -> Result<TableHandle>;

    /// Column names and types of the source, after field mapping
    async fn column_types(&self, source: &DataSource) -> Result<Vec<(String, ValueType)>>;
}
