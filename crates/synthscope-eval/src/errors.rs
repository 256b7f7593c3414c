use thiserror::Error;

use crate::model::MetricStatus;

/// Fatal errors emitted by the evaluation engine. A run that hits one of
/// these produces no report.
#[derive(Debug, Error)]
pub enum EvalError {
    #[error(transparent)]
    Core(#[from] synthscope_core::Error),
    #[error("unknown metric or category: {0}")]
    UnknownMetric(String),
    #[error("duplicate metric: {0}")]
    DuplicateMetric(String),
    #[error("invalid metric descriptor '{id}': {message}")]
    InvalidDescriptor { id: String, message: String },
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("worker pool error: {0}")]
    WorkerPool(String),
}

/// Errors raised inside a single metric. These never abort a run; the
/// engine records them on the metric's result.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MetricError {
    #[error("insufficient columns: {0}")]
    InsufficientColumns(String),
    #[error("missing target column: this metric requires `target_column` to be configured")]
    MissingTargetColumn,
    #[error("invalid target column: {0}")]
    InvalidTarget(String),
    #[error("computation failed: {0}")]
    Computation(String),
    #[error("timed out after {0} ms")]
    Timeout(u64),
    #[error("metric panicked: {0}")]
    Panicked(String),
}

impl MetricError {
    /// Report status for this error. Inapplicable metrics are skipped,
    /// everything else is a failure.
    pub fn status(&self) -> MetricStatus {
        match self {
            MetricError::InsufficientColumns(_) => MetricStatus::Skipped,
            _ => MetricStatus::Failed,
        }
    }
}
