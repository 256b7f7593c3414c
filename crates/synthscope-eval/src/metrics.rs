use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use synthscope_core::Schema;

use crate::descriptor::MetricCategory;
use crate::model::MetricStatus;

/// Report contract version.
pub const REPORT_VERSION: &str = "0.1";

/// Machine-readable result of an evaluation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Report {
    /// Per-metric entries ordered by category, then metric identifier.
    pub metrics: Vec<MetricEntry>,
    /// Aggregate per category; `null` when no metric in the category succeeded.
    pub categories: BTreeMap<MetricCategory, Option<f64>>,
    pub overall: Option<f64>,
    pub meta: ReportMeta,
    /// Schema profiled from the real dataset.
    pub schema: Schema,
}

impl Report {
    pub fn metric(&self, id: &str) -> Option<&MetricEntry> {
        self.metrics.iter().find(|entry| entry.name == id)
    }

    /// Aggregate for a category, `None` if absent or undefined.
    pub fn category(&self, category: MetricCategory) -> Option<f64> {
        self.categories.get(&category).copied().flatten()
    }

    pub fn count_status(&self, status: MetricStatus) -> usize {
        self.metrics
            .iter()
            .filter(|entry| entry.status == status)
            .count()
    }
}

/// One metric's line in the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct MetricEntry {
    /// Metric identifier.
    pub name: String,
    pub category: MetricCategory,
    pub status: MetricStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    /// Score on the common [0,1] higher-is-better scale.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub normalized: Option<f64>,
    pub weight: f64,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub details: BTreeMap<String, f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Run metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ReportMeta {
    pub report_version: String,
    pub run_id: String,
    /// RFC 3339 UTC timestamp of the run start.
    pub timestamp: String,
    pub n_real_rows: u64,
    pub n_synthetic_rows: u64,
    pub n_columns: u64,
    pub seed: u64,
    pub duration_ms: u64,
}
