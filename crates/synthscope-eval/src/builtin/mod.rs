//! Built-in fidelity, utility and privacy metrics.

use std::sync::Arc;

use crate::descriptor::MetricDescriptor;
use crate::metric::Metric;

mod distance;
mod fidelity;
mod privacy;
pub mod stats;
mod utility;

pub use fidelity::{CategoryCoverage, CorrelationDifference, KsDistance, TvDistance};
pub use privacy::{Dcr, EpsIdentifiability};
pub use utility::{Classification, Regression, holdout_split};

/// Every built-in metric with its descriptor.
pub fn builtins() -> Vec<(MetricDescriptor, Arc<dyn Metric>)> {
    let mut out = Vec::new();
    fidelity::register(&mut out);
    utility::register(&mut out);
    privacy::register(&mut out);
    out
}
