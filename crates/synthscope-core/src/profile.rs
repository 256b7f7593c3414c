use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::SCHEMA_VERSION;
use crate::dataset::{Column, Dataset};
use crate::error::{Error, Result};
use crate::schema::{ColumnSchema, Schema, SemanticType};
use crate::value::Value;

/// Thresholds for column classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileOptions {
    /// A numeric column is numerical only above this many distinct values.
    pub numeric_distinct_threshold: usize,
    /// A column is categorical below this many distinct values.
    pub categorical_cardinality_threshold: usize,
}

impl Default for ProfileOptions {
    fn default() -> Self {
        Self {
            numeric_distinct_threshold: 10,
            categorical_cardinality_threshold: 50,
        }
    }
}

/// Derive the semantic schema of the real dataset.
///
/// Classification order per column: boolean, datetime, numerical,
/// categorical, text. Only non-null values are inspected.
pub fn profile(dataset: &Dataset, options: &ProfileOptions) -> Result<Schema> {
    if dataset.n_columns() == 0 {
        return Err(Error::EmptyDataset("dataset has no columns".to_string()));
    }
    if dataset.n_rows() == 0 {
        return Err(Error::EmptyDataset("dataset has no rows".to_string()));
    }

    let columns = dataset
        .columns()
        .iter()
        .map(|column| profile_column(column, options))
        .collect();

    Ok(Schema {
        schema_version: SCHEMA_VERSION.to_string(),
        columns,
    })
}

fn profile_column(column: &Column, options: &ProfileOptions) -> ColumnSchema {
    let null_count = column.null_count() as u64;
    let distinct = column
        .values
        .iter()
        .filter_map(Value::key)
        .collect::<BTreeSet<_>>();
    let distinct_count = distinct.len() as u64;

    ColumnSchema {
        name: column.name.clone(),
        semantic_type: classify(column, distinct.len(), options),
        nullable: null_count > 0,
        null_count,
        distinct_count,
    }
}

fn classify(column: &Column, distinct: usize, options: &ProfileOptions) -> SemanticType {
    let has_values = column.non_null().next().is_some();

    if has_values && column.non_null().all(|value| value.as_bool().is_some()) {
        return SemanticType::Boolean;
    }

    if has_values && column.non_null().all(|value| value.as_datetime().is_some()) {
        return SemanticType::Datetime;
    }

    let all_numeric = has_values && column.non_null().all(|value| value.as_f64().is_some());
    if all_numeric && distinct > options.numeric_distinct_threshold {
        return SemanticType::Numerical;
    }

    if distinct < options.categorical_cardinality_threshold {
        return SemanticType::Categorical;
    }

    SemanticType::Text
}
