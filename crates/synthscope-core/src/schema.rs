use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Semantic type assigned to a column by the profiler.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum SemanticType {
    Numerical,
    Categorical,
    Datetime,
    Boolean,
    Text,
}

impl SemanticType {
    pub const ALL: [SemanticType; 5] = [
        SemanticType::Numerical,
        SemanticType::Categorical,
        SemanticType::Datetime,
        SemanticType::Boolean,
        SemanticType::Text,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SemanticType::Numerical => "numerical",
            SemanticType::Categorical => "categorical",
            SemanticType::Datetime => "datetime",
            SemanticType::Boolean => "boolean",
            SemanticType::Text => "text",
        }
    }

    /// Types whose values are compared on a continuous scale.
    pub fn is_continuous(&self) -> bool {
        matches!(self, SemanticType::Numerical | SemanticType::Datetime)
    }

    /// Types whose values are compared as discrete labels.
    pub fn is_discrete(&self) -> bool {
        matches!(self, SemanticType::Categorical | SemanticType::Boolean)
    }
}

impl std::fmt::Display for SemanticType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Schema entry for a single column of the real dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ColumnSchema {
    pub name: String,
    pub semantic_type: SemanticType,
    pub nullable: bool,
    pub null_count: u64,
    pub distinct_count: u64,
}

/// Profiled schema of the real dataset, in dataset column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Schema {
    /// Contract version for this schema format.
    pub schema_version: String,
    pub columns: Vec<ColumnSchema>,
}

impl Schema {
    pub fn column(&self, name: &str) -> Option<&ColumnSchema> {
        self.columns.iter().find(|column| column.name == name)
    }

    pub fn columns_of(&self, semantic_type: SemanticType) -> impl Iterator<Item = &ColumnSchema> {
        self.columns
            .iter()
            .filter(move |column| column.semantic_type == semantic_type)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|column| column.name.as_str()).collect()
    }
}
