//! Evaluation engine for synthetic datasets.
//!
//! Metrics implement [`Metric`] and are described by a [`MetricDescriptor`];
//! a [`MetricRegistry`] holds the catalog and an [`EvaluationEngine`] runs a
//! selection of it over a real/synthetic pair, producing a [`Report`].

pub mod aggregate;
pub mod builtin;
pub mod descriptor;
pub mod engine;
pub mod errors;
pub mod metric;
pub mod metrics;
pub mod model;
pub mod registry;
pub mod report;

pub use aggregate::Aggregator;
pub use descriptor::{DatasetRequirement, MetricCategory, MetricDescriptor, Orientation, ScoreScale};
pub use engine::{EvaluationEngine, PipelineState};
pub use errors::{EvalError, MetricError};
pub use metric::{Metric, MetricInput, MetricOutput, MetricParams};
pub use metrics::{MetricEntry, REPORT_VERSION, Report, ReportMeta};
pub use model::{EvaluateOptions, MetricResult, MetricStatus, NeighbourDistance};
pub use registry::{MetricRegistry, RegisteredMetric};
pub use report::render_report;
