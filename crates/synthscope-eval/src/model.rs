use std::collections::BTreeMap;
use std::time::Duration;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use synthscope_core::ProfileOptions;

use crate::descriptor::{MetricCategory, MetricDescriptor};
use crate::errors::{EvalError, MetricError};
use crate::metric::MetricOutput;

/// Options for an evaluation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluateOptions {
    /// Run seed; each metric receives a seed derived from it.
    pub seed: u64,
    /// Target column for utility metrics.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_column: Option<String>,
    /// Share of real rows held out for utility scoring.
    pub holdout_fraction: f64,
    /// Neighbour count for k-NN based metrics.
    pub neighbours: usize,
    /// Distance used by the nearest-neighbour privacy metrics.
    pub distance: NeighbourDistance,
    /// Restrict `fidelity.corr_diff` to Pearson correlation of numerical
    /// columns.
    pub corr_numeric_only: bool,
    /// Restrict metrics to these columns.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub columns: Option<Vec<String>>,
    /// Per-metric weight overrides.
    pub weights: BTreeMap<String, f64>,
    /// Per-category weights for the overall score, keyed by category name.
    pub category_weights: BTreeMap<String, f64>,
    pub profile: ProfileOptions,
    /// Default per-metric timeout.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
    /// Per-metric timeout overrides.
    pub metric_timeouts_ms: BTreeMap<String, u64>,
    /// Worker threads; defaults to available parallelism.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workers: Option<usize>,
}

impl Default for EvaluateOptions {
    fn default() -> Self {
        Self {
            seed: 42,
            target_column: None,
            holdout_fraction: 0.3,
            neighbours: 5,
            distance: NeighbourDistance::Gower,
            corr_numeric_only: false,
            columns: None,
            weights: BTreeMap::new(),
            category_weights: BTreeMap::new(),
            profile: ProfileOptions::default(),
            timeout_ms: None,
            metric_timeouts_ms: BTreeMap::new(),
            workers: None,
        }
    }
}

impl EvaluateOptions {
    /// Check option ranges that do not depend on the datasets.
    pub fn validate(&self) -> Result<(), EvalError> {
        if !(self.holdout_fraction > 0.0 && self.holdout_fraction < 1.0) {
            return Err(EvalError::InvalidConfig(format!(
                "holdout_fraction must be in (0, 1), got {}",
                self.holdout_fraction
            )));
        }
        if self.neighbours == 0 {
            return Err(EvalError::InvalidConfig(
                "neighbours must be >= 1".to_string(),
            ));
        }
        if self.workers == Some(0) {
            return Err(EvalError::InvalidConfig("workers must be >= 1".to_string()));
        }
        for (id, weight) in &self.weights {
            if !weight.is_finite() || *weight < 0.0 {
                return Err(EvalError::InvalidConfig(format!(
                    "weight for '{id}' must be finite and >= 0, got {weight}"
                )));
            }
        }
        for (name, weight) in &self.category_weights {
            if MetricCategory::parse(name).is_none() {
                return Err(EvalError::InvalidConfig(format!(
                    "unknown category in category_weights: {name}"
                )));
            }
            if !weight.is_finite() || *weight < 0.0 {
                return Err(EvalError::InvalidConfig(format!(
                    "category weight for '{name}' must be finite and >= 0, got {weight}"
                )));
            }
        }
        Ok(())
    }

    /// Timeout for a metric, preferring the per-metric override.
    pub fn timeout_for(&self, metric_id: &str) -> Option<Duration> {
        self.metric_timeouts_ms
            .get(metric_id)
            .copied()
            .or(self.timeout_ms)
            .map(Duration::from_millis)
    }

    /// Category weights with unspecified categories defaulting to 1.0.
    pub fn resolved_category_weights(&self) -> BTreeMap<MetricCategory, f64> {
        MetricCategory::ALL
            .into_iter()
            .map(|category| {
                let weight = self
                    .category_weights
                    .iter()
                    .find(|(name, _)| MetricCategory::parse(name) == Some(category))
                    .map(|(_, weight)| *weight)
                    .unwrap_or(1.0);
                (category, weight)
            })
            .collect()
    }
}

/// Record distance for nearest-neighbour searches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NeighbourDistance {
    /// Range-scaled mixed-type distance over every profiled column.
    #[default]
    Gower,
    /// Range-scaled Euclidean distance over numerical columns only.
    Euclid,
}

impl NeighbourDistance {
    pub fn as_str(&self) -> &'static str {
        match self {
            NeighbourDistance::Gower => "gower",
            NeighbourDistance::Euclid => "euclid",
        }
    }
}

/// Outcome of a single metric invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum MetricStatus {
    Ok,
    Skipped,
    Failed,
}

impl MetricStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricStatus::Ok => "ok",
            MetricStatus::Skipped => "skipped",
            MetricStatus::Failed => "failed",
        }
    }
}

/// Raw result of one metric in one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricResult {
    pub metric: String,
    pub category: MetricCategory,
    pub status: MetricStatus,
    pub score: Option<f64>,
    pub details: BTreeMap<String, f64>,
    pub error: Option<String>,
}

impl MetricResult {
    pub fn ok(descriptor: &MetricDescriptor, output: MetricOutput) -> Self {
        Self {
            metric: descriptor.id.clone(),
            category: descriptor.category,
            status: MetricStatus::Ok,
            score: Some(output.score),
            details: output.details,
            error: None,
        }
    }

    pub fn from_error(descriptor: &MetricDescriptor, error: &MetricError) -> Self {
        Self {
            metric: descriptor.id.clone(),
            category: descriptor.category,
            status: error.status(),
            score: None,
            details: BTreeMap::new(),
            error: Some(error.to_string()),
        }
    }
}
