//! In-memory connector
//!
//! Tables are registered under the storage location a data source resolves
//! to: the file path, the warehouse table name or a partition path.

use super::{DataSourceConnector, MaterializationWindow, TableHandle};
use crate::error::{Result, RuntimeError};
use crate::table::FeatureTable;
use sluice_core::{DataSource, DataSourceKind, ValueType};
use std::collections::BTreeMap;
use tokio::sync::RwLock;
use tracing::debug;

/// Connector over tables held in memory
#[derive(Debug, Default)]
pub struct InMemoryConnector {
    tables: RwLock<BTreeMap<String, FeatureTable>>,
}

impl InMemoryConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the table stored at `location`
    pub async fn register(&self, location: impl Into<String>, table: FeatureTable) {
        self.tables.write().await.insert(location.into(), table);
    }

    /// Rows of `source` before windowing and field mapping
    async fn read(
        &self,
        source: &DataSource,
        window: Option<MaterializationWindow>,
    ) -> Result<FeatureTable> {
        let tables = self.tables.read().await;

        let parts: Vec<FeatureTable> = match &source.kind {
            DataSourceKind::TimePartitionedFile { .. } => {
                let locations = source.locations(window.map(|w| (w.start, w.end)))?;
                match window {
                    Some(_) => locations
                        .iter()
                        .filter_map(|location| tables.get(location).cloned())
                        .collect(),
                    None => {
                        let prefix = locations.first().map(String::as_str).unwrap_or_default();
                        let parts: Vec<FeatureTable> = tables
                            .range(prefix.to_string()..)
                            .take_while(|(location, _)| location.starts_with(prefix))
                            .map(|(_, table)| table.clone())
                            .collect();
                        if parts.is_empty() {
                            return Err(RuntimeError::Connector(format!(
                                "No partitions found under '{}' for source '{}'",
                                prefix, source.name
                            )));
                        }
                        parts
                    }
                }
            }
            _ => {
                let mut parts = Vec::new();
                for location in source.locations(None)? {
                    let table = tables.get(&location).ok_or_else(|| {
                        RuntimeError::Connector(format!(
                            "Table '{}' for source '{}' not found",
                            location, source.name
                        ))
                    })?;
                    parts.push(table.clone());
                }
                parts
            }
        };

        debug!("Read {} tables for source '{}'", parts.len(), source.name);
        Ok(FeatureTable::concat(&parts))
    }
}

#[async_trait::async_trait]
impl DataSourceConnector for InMemoryConnector {
    async fn table_handle(
        &self,
        source: &DataSource,
        window: Option<MaterializationWindow>,
    ) -> Result<TableHandle> {
        let batch_source = source.batch_source();
        let mut table = self.read(batch_source, window).await?;

        if let Some(window) = window {
            let timestamp_field = batch_source.timestamp_field.as_deref().ok_or_else(|| {
                RuntimeError::Configuration(format!(
                    "Source '{}' has no timestamp field to filter on",
                    batch_source.name
                ))
            })?;
            if !table.is_empty() {
                table = table.filter_rows(|t, i| {
                    t.value(timestamp_field, i)
                        .and_then(|v| v.as_timestamp())
                        .map(|ts| window.contains(ts))
                        .unwrap_or(false)
                });
            }
        }

        for (native, feature) in &batch_source.field_mapping {
            table.rename_column(native, feature);
        }

        Ok(TableHandle::temporary(table))
    }

    async fn column_types(&self, source: &DataSource) -> Result<Vec<(String, ValueType)>> {
        let handle = self.table_handle(source, None).await?;
        Ok(handle.table.column_types())
    }
}
