//! Data source descriptors
//!
//! A data source names an external readable table. The core never reads it;
//! connectors turn a descriptor into a queryable handle.

use super::{impl_catalog_object, ObjectKind, ObjectMeta};
use crate::error::{CoreError, Result};
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write;
use std::str::FromStr;

/// On-disk format of a file-backed source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    Csv,
    Json,
    #[default]
    Parquet,
    Delta,
    Avro,
}

impl FromStr for FileFormat {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(FileFormat::Csv),
            "json" => Ok(FileFormat::Json),
            "parquet" => Ok(FileFormat::Parquet),
            "delta" => Ok(FileFormat::Delta),
            "avro" => Ok(FileFormat::Avro),
            other => Err(CoreError::Configuration(format!(
                "Unknown file format '{}'",
                other
            ))),
        }
    }
}

/// Where and how a source's rows are stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DataSourceKind {
    /// A single file or directory
    File {
        path: String,
        #[serde(default)]
        file_format: FileFormat,
    },

    /// Files partitioned by time; the partition path is
    /// `path_prefix + strftime(time_fmt) + path_suffix`
    TimePartitionedFile {
        path_prefix: String,
        time_fmt: String,
        #[serde(default)]
        path_suffix: String,
        #[serde(default)]
        file_format: FileFormat,
        /// Distance between consecutive partitions
        #[serde(default = "default_partition_step")]
        partition_step_secs: i64,
    },

    /// Push source; rows arrive at serving time, history lives in `batch_source`
    Push { batch_source: Box<DataSource> },

    /// A table in an external warehouse
    Table { table: String },
}

fn default_partition_step() -> i64 {
    86_400
}

/// Upper bound on the partitions a single window may enumerate
pub const MAX_WINDOW_PARTITIONS: usize = 100_000;

/// Named descriptor of an external readable table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSource {
    pub name: String,

    #[serde(flatten)]
    pub kind: DataSourceKind,

    /// Column holding the event timestamp
    #[serde(default)]
    pub timestamp_field: Option<String>,

    /// Column holding the row creation timestamp
    #[serde(default)]
    pub created_timestamp_column: Option<String>,

    /// Native column name -> feature name
    #[serde(default)]
    pub field_mapping: BTreeMap<String, String>,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub tags: BTreeMap<String, String>,

    #[serde(default)]
    pub owner: String,

    #[serde(default)]
    pub meta: ObjectMeta,
}

impl_catalog_object!(DataSource, ObjectKind::DataSource, validated);

impl DataSource {
    fn with_kind(name: impl Into<String>, kind: DataSourceKind) -> Self {
        Self {
            name: name.into(),
            kind,
            timestamp_field: None,
            created_timestamp_column: None,
            field_mapping: BTreeMap::new(),
            description: String::new(),
            tags: BTreeMap::new(),
            owner: String::new(),
            meta: ObjectMeta::default(),
        }
    }

    /// File-backed source
    pub fn file(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self::with_kind(
            name,
            DataSourceKind::File {
                path: path.into(),
                file_format: FileFormat::default(),
            },
        )
    }

    /// Time-partitioned file source; fails if `time_fmt` is not a valid
    /// strftime format
    pub fn time_partitioned(
        name: impl Into<String>,
        path_prefix: impl Into<String>,
        time_fmt: impl Into<String>,
        path_suffix: impl Into<String>,
    ) -> Result<Self> {
        let time_fmt = time_fmt.into();
        validate_time_fmt(&time_fmt)?;
        Ok(Self::with_kind(
            name,
            DataSourceKind::TimePartitionedFile {
                path_prefix: path_prefix.into(),
                time_fmt,
                path_suffix: path_suffix.into(),
                file_format: FileFormat::default(),
                partition_step_secs: default_partition_step(),
            },
        ))
    }

    /// Push source backed by `batch_source` for history
    pub fn push(name: impl Into<String>, batch_source: DataSource) -> Self {
        Self::with_kind(
            name,
            DataSourceKind::Push {
                batch_source: Box::new(batch_source),
            },
        )
    }

    /// Warehouse table source
    pub fn table(name: impl Into<String>, table: impl Into<String>) -> Self {
        Self::with_kind(name, DataSourceKind::Table { table: table.into() })
    }

    pub fn with_timestamp_field(mut self, field: impl Into<String>) -> Self {
        self.timestamp_field = Some(field.into());
        self
    }

    pub fn with_created_timestamp_column(mut self, column: impl Into<String>) -> Self {
        self.created_timestamp_column = Some(column.into());
        self
    }

    pub fn with_field_mapping(mut self, native: impl Into<String>, feature: impl Into<String>) -> Self {
        self.field_mapping.insert(native.into(), feature.into());
        self
    }

    pub fn with_file_format(mut self, format: FileFormat) -> Self {
        match &mut self.kind {
            DataSourceKind::File { file_format, .. }
            | DataSourceKind::TimePartitionedFile { file_format, .. } => *file_format = format,
            _ => {}
        }
        self
    }

    pub fn with_partition_step(mut self, step: Duration) -> Self {
        if let DataSourceKind::TimePartitionedFile {
            partition_step_secs,
            ..
        } = &mut self.kind
        {
            *partition_step_secs = step.num_seconds();
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(CoreError::InvalidDefinition(
                "Data source name cannot be empty".to_string(),
            ));
        }
        match &self.kind {
            DataSourceKind::TimePartitionedFile { time_fmt, .. } => validate_time_fmt(time_fmt),
            DataSourceKind::Push { batch_source } => batch_source.validate(),
            _ => Ok(()),
        }
    }

    /// Source that actually holds historical rows (push sources delegate)
    pub fn batch_source(&self) -> &DataSource {
        match &self.kind {
            DataSourceKind::Push { batch_source } => batch_source.batch_source(),
            _ => self,
        }
    }

    /// Storage locations covering `window`
    ///
    /// Time-partitioned sources enumerate one path per partition in
    /// `[start, end]`; without a window only the prefix is returned. A window
    /// spanning more than [`MAX_WINDOW_PARTITIONS`] steps, or a step too large
    /// to represent, is an invalid definition.
    pub fn locations(&self, window: Option<(DateTime<Utc>, DateTime<Utc>)>) -> Result<Vec<String>> {
        match &self.kind {
            DataSourceKind::File { path, .. } => Ok(vec![path.clone()]),
            DataSourceKind::Table { table } => Ok(vec![table.clone()]),
            DataSourceKind::Push { batch_source } => batch_source.locations(window),
            DataSourceKind::TimePartitionedFile {
                path_prefix,
                time_fmt,
                path_suffix,
                partition_step_secs,
                ..
            } => {
                let Some((start, end)) = window else {
                    return Ok(vec![path_prefix.clone()]);
                };
                if *partition_step_secs <= 0 {
                    return Err(CoreError::InvalidDefinition(format!(
                        "Data source '{}' has a non-positive partition step",
                        self.name
                    )));
                }

                let items: Vec<Item<'_>> = StrftimeItems::new(time_fmt).collect();
                let partition = |at: DateTime<Utc>| -> Result<String> {
                    let mut path = path_prefix.clone();
                    write!(path, "{}", at.format_with_items(items.iter())).map_err(|_| {
                        CoreError::Configuration(format!("Invalid time format '{}'", time_fmt))
                    })?;
                    path.push_str(path_suffix);
                    Ok(path)
                };

                let step = Duration::try_seconds(*partition_step_secs).ok_or_else(|| {
                    CoreError::InvalidDefinition(format!(
                        "Data source '{}' has a partition step beyond the representable range",
                        self.name
                    ))
                })?;
                let mut paths: Vec<String> = Vec::new();
                let mut cursor = start;
                let mut steps = 0usize;
                while cursor <= end {
                    steps += 1;
                    if steps > MAX_WINDOW_PARTITIONS {
                        return Err(CoreError::InvalidDefinition(format!(
                            "Data source '{}' window spans more than {} partitions",
                            self.name, MAX_WINDOW_PARTITIONS
                        )));
                    }
                    let path = partition(cursor)?;
                    if paths.last() != Some(&path) {
                        paths.push(path);
                    }
                    // past the last representable instant, so past `end` too
                    match cursor.checked_add_signed(step) {
                        Some(next) => cursor = next,
                        None => break,
                    }
                }
                // the partition holding `end` may start after the last step
                let last = partition(end)?;
                if start <= end && !paths.contains(&last) {
                    paths.push(last);
                }
                Ok(paths)
            }
        }
    }
}

fn validate_time_fmt(time_fmt: &str) -> Result<()> {
    if time_fmt.is_empty() || StrftimeItems::new(time_fmt).any(|item| matches!(item, Item::Error)) {
        return Err(CoreError::Configuration(format!(
            "Invalid time format '{}'",
            time_fmt
        )));
    }
    Ok(())
}
