use std::sync::Arc;

use synthscope_core::SemanticType;

use crate::builtin::distance::{Cell, FeatureSpace};
use crate::builtin::stats;
use crate::descriptor::{MetricCategory, MetricDescriptor, ScoreScale};
use crate::errors::MetricError;
use crate::metric::{Metric, MetricInput, MetricOutput};
use crate::model::NeighbourDistance;

/// Percentile of real-to-real nearest distances below which a synthetic
/// record counts as too close.
const DCR_PERCENTILE: f64 = 5.0;
/// Keeps entropy weights finite for constant columns.
const ENTROPY_FLOOR: f64 = 1e-16;

pub(super) fn register(out: &mut Vec<(MetricDescriptor, Arc<dyn Metric>)>) {
    out.push((
        MetricDescriptor::new("privacy.dcr", MetricCategory::Privacy)
            .requires(&SemanticType::ALL)
            .lower_is_better()
            .describe("Share of synthetic records closer to a real record than the 5th percentile of real nearest-neighbour distances"),
        Arc::new(Dcr),
    ));
    out.push((
        MetricDescriptor::new("privacy.eps_identifiability", MetricCategory::Privacy)
            .requires(&SemanticType::ALL)
            .scale(ScoreScale::Exponential { rate: 5.0 })
            .lower_is_better()
            .describe("Share of real records whose nearest synthetic record is closer than their nearest real neighbour"),
        Arc::new(EpsIdentifiability),
    ));
}

/// Feature space fitted on the real dataset for the configured distance.
/// Euclidean distance only sees numerical columns.
fn neighbour_space(input: &MetricInput<'_>) -> Result<FeatureSpace, MetricError> {
    let kind = input.params.distance;
    let columns = match kind {
        NeighbourDistance::Gower => {
            input.require_columns(|_| true, 1, "at least one profiled column")?
        }
        NeighbourDistance::Euclid => input.require_columns(
            |semantic_type| semantic_type == SemanticType::Numerical,
            1,
            "at least one numerical column for euclid distance",
        )?,
    };
    Ok(FeatureSpace::fit(&columns, input.real)?.with_distance(kind))
}

fn ensure_real_rows(rows: &[Vec<Cell>]) -> Result<(), MetricError> {
    if rows.len() < 2 {
        return Err(MetricError::Computation(format!(
            "nearest-neighbour distances need at least 2 real rows, found {}",
            rows.len()
        )));
    }
    Ok(())
}

pub struct Dcr;

impl Metric for Dcr {
    fn compute(&self, input: &MetricInput<'_>) -> Result<MetricOutput, MetricError> {
        let space = neighbour_space(input)?;
        let real = space.encode(input.real)?;
        let synthetic = space.encode(input.synthetic)?;
        ensure_real_rows(&real)?;

        let real_nn = space.nearest(&real, &real, true);
        let threshold = stats::percentile(&real_nn, DCR_PERCENTILE).ok_or_else(|| {
            MetricError::Computation("no real nearest-neighbour distances".to_string())
        })?;

        let synthetic_nn = space.nearest(&synthetic, &real, false);
        let close = synthetic_nn.iter().filter(|distance| **distance <= threshold).count();
        let share = close as f64 / synthetic_nn.len().max(1) as f64;

        Ok(MetricOutput::new(share)
            .with_detail("threshold", threshold)
            .with_detail("mean_distance", stats::mean(&synthetic_nn).unwrap_or(0.0)))
    }
}

pub struct EpsIdentifiability;

impl EpsIdentifiability {
    /// Inverse-entropy weight per feature over non-missing cells. Continuous
    /// values are rounded to integers before counting.
    fn weights(space: &FeatureSpace, real: &[Vec<Cell>]) -> Vec<f64> {
        (0..space.len())
            .map(|index| {
                let keys = space
                    .feature_cells(real, index)
                    .into_iter()
                    .filter_map(|cell| match cell {
                        Cell::Missing => None,
                        Cell::Number(value) => Some(format!("{}", value.round())),
                        Cell::Label(value) => Some(value.clone()),
                    })
                    .collect::<Vec<_>>();
                let entropy = stats::entropy(keys.iter().map(String::as_str));
                1.0 / (entropy + ENTROPY_FLOOR)
            })
            .collect()
    }
}

impl Metric for EpsIdentifiability {
    fn compute(&self, input: &MetricInput<'_>) -> Result<MetricOutput, MetricError> {
        let space = neighbour_space(input)?;
        let real = space.encode(input.real)?;
        ensure_real_rows(&real)?;

        let weights = Self::weights(&space, &real);
        let space = space.with_weights(&weights);
        let synthetic = space.encode(input.synthetic)?;

        let internal = space.nearest(&real, &real, true);
        let external = space.nearest(&real, &synthetic, false);
        let identifiable = internal
            .iter()
            .zip(&external)
            .filter(|(internal, external)| external < internal)
            .count();

        Ok(MetricOutput::new(identifiable as f64 / real.len() as f64)
            .with_detail("identifiable_records", identifiable as f64))
    }
}
