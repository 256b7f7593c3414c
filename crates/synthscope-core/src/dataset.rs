use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::value::Value;

/// A named column of cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub values: Vec<Value>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    pub fn null_count(&self) -> usize {
        self.values.iter().filter(|value| value.is_null()).count()
    }

    pub fn non_null(&self) -> impl Iterator<Item = &Value> {
        self.values.iter().filter(|value| !value.is_null())
    }
}

/// Column-oriented, in-memory table.
///
/// Column names are unique and every column has the same number of rows.
/// Deserialization goes through [`Dataset::new`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawDataset")]
pub struct Dataset {
    columns: Vec<Column>,
}

#[derive(Deserialize)]
struct RawDataset {
    columns: Vec<Column>,
}

impl TryFrom<RawDataset> for Dataset {
    type Error = Error;

    fn try_from(raw: RawDataset) -> Result<Self> {
        Dataset::new(raw.columns)
    }
}

impl Dataset {
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        let mut names = BTreeSet::new();
        for column in &columns {
            if !names.insert(column.name.as_str()) {
                return Err(Error::InvalidDataset(format!(
                    "duplicate column name: {}",
                    column.name
                )));
            }
        }

        if let Some(first) = columns.first() {
            let rows = first.values.len();
            for column in &columns {
                if column.values.len() != rows {
                    return Err(Error::InvalidDataset(format!(
                        "column '{}' has {} row(s), expected {}",
                        column.name,
                        column.values.len(),
                        rows
                    )));
                }
            }
        }

        Ok(Self { columns })
    }

    /// Build a dataset from a header row and row-major records.
    pub fn from_rows(headers: &[String], rows: Vec<Vec<Value>>) -> Result<Self> {
        let mut columns = headers
            .iter()
            .map(|name| Column::new(name.clone(), Vec::with_capacity(rows.len())))
            .collect::<Vec<_>>();

        for (row_idx, row) in rows.into_iter().enumerate() {
            if row.len() != headers.len() {
                return Err(Error::InvalidDataset(format!(
                    "row {} has {} field(s), expected {}",
                    row_idx + 1,
                    row.len(),
                    headers.len()
                )));
            }
            for (column, value) in columns.iter_mut().zip(row) {
                column.values.push(value);
            }
        }

        Self::new(columns)
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|column| column.name == name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|column| column.name.as_str()).collect()
    }

    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn n_rows(&self) -> usize {
        self.columns
            .first()
            .map(|column| column.values.len())
            .unwrap_or(0)
    }

    /// True when there are no columns or no rows.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty() || self.n_rows() == 0
    }
}
