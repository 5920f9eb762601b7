//! Feature tables
//!
//! A [`FeatureTable`] is an ordered set of equally long columns. It is the
//! batch unit of tabular transformations; a [`Row`] is the unit of row
//! transformations.

use crate::error::{Result, RuntimeError};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use sluice_core::{Value, ValueType};

/// One row: field name -> value, in column order
pub type Row = IndexMap<String, Value>;

/// Ordered column name -> values, every column `num_rows` long
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureTable {
    columns: IndexMap<String, Vec<Value>>,
    num_rows: usize,
}

impl FeatureTable {
    /// Table with no columns and no rows
    pub fn new() -> Self {
        Self::default()
    }

    /// Table with no columns and `num_rows` rows
    pub fn with_num_rows(num_rows: usize) -> Self {
        Self {
            columns: IndexMap::new(),
            num_rows,
        }
    }

    /// Build from columns; all columns must have the same length
    pub fn from_columns<I, S>(columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, Vec<Value>)>,
        S: Into<String>,
    {
        let mut table = Self::new();
        for (name, values) in columns {
            table.insert_column(name, values)?;
        }
        Ok(table)
    }

    /// Build from rows; the column set is the union of row fields in first-seen
    /// order and missing fields are null
    pub fn from_rows(rows: &[Row]) -> Self {
        let mut columns: IndexMap<String, Vec<Value>> = IndexMap::new();
        for (i, row) in rows.iter().enumerate() {
            for name in row.keys() {
                if !columns.contains_key(name) {
                    columns.insert(name.clone(), vec![Value::Null; i]);
                }
            }
            for (name, values) in columns.iter_mut() {
                values.push(row.get(name).cloned().unwrap_or(Value::Null));
            }
        }
        Self {
            columns,
            num_rows: rows.len(),
        }
    }

    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.num_rows == 0
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    pub fn column(&self, name: &str) -> Option<&[Value]> {
        self.columns.get(name).map(Vec::as_slice)
    }

    /// Iterate `(name, values)` in column order
    pub fn columns(&self) -> impl Iterator<Item = (&str, &[Value])> {
        self.columns
            .iter()
            .map(|(name, values)| (name.as_str(), values.as_slice()))
    }

    pub fn value(&self, name: &str, row: usize) -> Option<&Value> {
        self.columns.get(name)?.get(row)
    }

    /// Insert or replace a column
    ///
    /// The first column of a table without columns sets its row count.
    pub fn insert_column(&mut self, name: impl Into<String>, values: Vec<Value>) -> Result<()> {
        let name = name.into();
        if self.columns.is_empty() {
            self.num_rows = values.len();
        } else if values.len() != self.num_rows {
            return Err(RuntimeError::InvalidTable(format!(
                "column '{}' has {} values, expected {}",
                name,
                values.len(),
                self.num_rows
            )));
        }
        self.columns.insert(name, values);
        Ok(())
    }

    pub fn remove_column(&mut self, name: &str) -> Option<Vec<Value>> {
        self.columns.shift_remove(name)
    }

    /// Rename a column in place, keeping its position; returns whether it existed
    pub fn rename_column(&mut self, from: &str, to: &str) -> bool {
        let Some(index) = self.columns.get_index_of(from) else {
            return false;
        };
        if from == to {
            return true;
        }
        self.columns.shift_remove(to);
        let index = self.columns.get_index_of(from).unwrap_or(index);
        if let Some(values) = self.columns.shift_remove(from) {
            self.columns.shift_insert(index.min(self.columns.len()), to.to_string(), values);
        }
        true
    }

    /// Copy of row `index`
    pub fn row(&self, index: usize) -> Result<Row> {
        if index >= self.num_rows {
            return Err(RuntimeError::InvalidTable(format!(
                "row {} out of range for {} rows",
                index, self.num_rows
            )));
        }
        Ok(self
            .columns
            .iter()
            .map(|(name, values)| (name.clone(), values[index].clone()))
            .collect())
    }

    /// Copies of every row
    pub fn rows(&self) -> impl Iterator<Item = Row> + '_ {
        (0..self.num_rows).map(move |i| {
            self.columns
                .iter()
                .map(|(name, values)| (name.clone(), values[i].clone()))
                .collect()
        })
    }

    /// Keep only rows for which `keep` returns true
    pub fn filter_rows<F>(&self, mut keep: F) -> Self
    where
        F: FnMut(&FeatureTable, usize) -> bool,
    {
        let indices: Vec<usize> = (0..self.num_rows).filter(|&i| keep(self, i)).collect();
        let columns = self
            .columns
            .iter()
            .map(|(name, values)| {
                (
                    name.clone(),
                    indices.iter().map(|&i| values[i].clone()).collect(),
                )
            })
            .collect();
        Self {
            columns,
            num_rows: indices.len(),
        }
    }

    /// Stack tables vertically; the column set is the union in first-seen order
    pub fn concat(tables: &[FeatureTable]) -> Self {
        let mut columns: IndexMap<String, Vec<Value>> = IndexMap::new();
        let mut num_rows = 0;
        for table in tables {
            for name in table.columns.keys() {
                if !columns.contains_key(name) {
                    columns.insert(name.clone(), vec![Value::Null; num_rows]);
                }
            }
            for (name, values) in columns.iter_mut() {
                match table.columns.get(name) {
                    Some(extra) => values.extend(extra.iter().cloned()),
                    None => values.extend(std::iter::repeat(Value::Null).take(table.num_rows)),
                }
            }
            num_rows += table.num_rows;
        }
        Self { columns, num_rows }
    }

    /// Type of every column, taken from its first non-null value
    pub fn column_types(&self) -> Vec<(String, ValueType)> {
        self.columns
            .iter()
            .map(|(name, values)| {
                let dtype = values
                    .iter()
                    .find(|v| !v.is_null())
                    .map(Value::value_type)
                    .unwrap_or(ValueType::Unknown);
                (name.clone(), dtype)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> FeatureTable {
        FeatureTable::from_columns(vec![
            ("driver_id", vec![Value::Int(1001), Value::Int(1002)]),
            ("conv_rate", vec![Value::Float(0.5), Value::Float(0.25)]),
        ])
        .unwrap()
    }

    #[test]
    fn test_from_columns_checks_lengths() {
        let result = FeatureTable::from_columns(vec![
            ("a", vec![Value::Int(1)]),
            ("b", vec![Value::Int(1), Value::Int(2)]),
        ]);
        assert!(matches!(result, Err(RuntimeError::InvalidTable(_))));
    }

    #[test]
    fn test_rows_roundtrip() {
        let table = sample();
        let rows: Vec<Row> = table.rows().collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1]["conv_rate"], Value::Float(0.25));
        assert_eq!(FeatureTable::from_rows(&rows), table);
    }

    #[test]
    fn test_from_rows_fills_missing_fields() {
        let mut first = Row::new();
        first.insert("a".into(), Value::Int(1));
        let mut second = Row::new();
        second.insert("b".into(), Value::Int(2));

        let table = FeatureTable::from_rows(&[first, second]);
        assert_eq!(table.column("a").unwrap(), &[Value::Int(1), Value::Null]);
        assert_eq!(table.column("b").unwrap(), &[Value::Null, Value::Int(2)]);
    }

    #[test]
    fn test_rename_keeps_position() {
        let mut table = sample();
        assert!(table.rename_column("driver_id", "driver"));
        let names: Vec<_> = table.column_names().collect();
        assert_eq!(names, vec!["driver", "conv_rate"]);
        assert!(!table.rename_column("missing", "x"));
    }

    #[test]
    fn test_rename_over_existing_column() {
        let mut table = sample();
        assert!(table.rename_column("conv_rate", "driver_id"));
        let names: Vec<_> = table.column_names().collect();
        assert_eq!(names, vec!["driver_id"]);
        assert_eq!(table.value("driver_id", 0), Some(&Value::Float(0.5)));
    }

    #[test]
    fn test_concat_unions_columns() {
        let other = FeatureTable::from_columns(vec![("acc_rate", vec![Value::Float(0.9)])]).unwrap();
        let table = FeatureTable::concat(&[sample(), other]);

        assert_eq!(table.num_rows(), 3);
        assert_eq!(table.value("acc_rate", 0), Some(&Value::Null));
        assert_eq!(table.value("driver_id", 2), Some(&Value::Null));
    }

    #[test]
    fn test_filter_rows() {
        let table = sample().filter_rows(|t, i| t.value("driver_id", i) == Some(&Value::Int(1002)));
        assert_eq!(table.num_rows(), 1);
        assert_eq!(table.value("conv_rate", 0), Some(&Value::Float(0.25)));
    }

    #[test]
    fn test_column_types() {
        let types = sample().column_types();
        assert_eq!(
            types,
            vec![
                ("driver_id".to_string(), ValueType::Int64),
                ("conv_rate".to_string(), ValueType::Float64),
            ]
        );
    }
}
