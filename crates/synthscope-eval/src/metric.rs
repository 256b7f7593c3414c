use std::collections::BTreeMap;

use synthscope_core::{Column, ColumnSchema, Dataset, Schema, SemanticType};

use crate::errors::MetricError;
use crate::model::NeighbourDistance;

/// A pluggable evaluation unit.
///
/// Implementations must be pure: the same input always yields the same
/// output, and nothing is shared between invocations. Randomized steps draw
/// from [`MetricParams::seed`].
pub trait Metric: Send + Sync {
    fn compute(&self, input: &MetricInput<'_>) -> Result<MetricOutput, MetricError>;
}

/// Run parameters handed to every metric.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricParams {
    /// Seed derived from the run seed and the metric identifier.
    pub seed: u64,
    pub target_column: Option<String>,
    pub holdout_fraction: f64,
    pub neighbours: usize,
    pub distance: NeighbourDistance,
    pub corr_numeric_only: bool,
}

/// Read-only view of everything a metric may inspect.
#[derive(Debug, Clone, Copy)]
pub struct MetricInput<'a> {
    pub metric_id: &'a str,
    pub real: &'a Dataset,
    pub synthetic: &'a Dataset,
    pub schema: &'a Schema,
    /// Optional restriction to a subset of columns.
    pub columns: Option<&'a [String]>,
    pub params: &'a MetricParams,
}

impl<'a> MetricInput<'a> {
    /// Schema entries the metric is allowed to look at.
    pub fn in_scope(&self) -> impl Iterator<Item = &'a ColumnSchema> + 'a {
        let schema: &'a Schema = self.schema;
        let columns = self.columns;
        schema.columns.iter().filter(move |column| {
            columns.is_none_or(|allowed| allowed.iter().any(|name| *name == column.name))
        })
    }

    /// In-scope columns whose semantic type matches `predicate`.
    pub fn columns_where(
        &self,
        predicate: impl Fn(SemanticType) -> bool,
    ) -> Vec<&'a ColumnSchema> {
        self.in_scope()
            .filter(|column| predicate(column.semantic_type))
            .collect()
    }

    /// Like [`columns_where`](Self::columns_where) but signals
    /// [`MetricError::InsufficientColumns`] below `min` matches.
    pub fn require_columns(
        &self,
        predicate: impl Fn(SemanticType) -> bool,
        min: usize,
        requirement: &str,
    ) -> Result<Vec<&'a ColumnSchema>, MetricError> {
        let columns = self.columns_where(predicate);
        if columns.len() < min {
            return Err(MetricError::InsufficientColumns(format!(
                "{} needs {requirement}, found {}",
                self.metric_id,
                columns.len()
            )));
        }
        Ok(columns)
    }

    /// Schema entry of the configured target column.
    pub fn target(&self) -> Result<&'a ColumnSchema, MetricError> {
        let name = self
            .params
            .target_column
            .as_deref()
            .ok_or(MetricError::MissingTargetColumn)?;
        self.schema
            .column(name)
            .ok_or_else(|| MetricError::InvalidTarget(format!("column '{name}' not in schema")))
    }

    pub fn real_column(&self, name: &str) -> Result<&'a Column, MetricError> {
        self.real.column(name).ok_or_else(|| {
            MetricError::Computation(format!("column '{name}' missing from real dataset"))
        })
    }

    pub fn synthetic_column(&self, name: &str) -> Result<&'a Column, MetricError> {
        self.synthetic.column(name).ok_or_else(|| {
            MetricError::Computation(format!("column '{name}' missing from synthetic dataset"))
        })
    }
}

/// Raw outcome of a metric: a headline score plus named sub-scores.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricOutput {
    pub score: f64,
    pub details: BTreeMap<String, f64>,
}

impl MetricOutput {
    pub fn new(score: f64) -> Self {
        Self {
            score,
            details: BTreeMap::new(),
        }
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: f64) -> Self {
        self.details.insert(key.into(), value);
        self
    }

    pub fn with_details(mut self, details: impl IntoIterator<Item = (String, f64)>) -> Self {
        self.details.extend(details);
        self
    }
}
