use std::sync::Arc;

use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;

use synthscope_core::{ColumnSchema, Dataset, SemanticType, Value};

use crate::builtin::distance::{Cell, FeatureSpace, label_of, majority_label, number_of};
use crate::builtin::stats;
use crate::descriptor::{MetricCategory, MetricDescriptor};
use crate::errors::MetricError;
use crate::metric::{Metric, MetricInput, MetricOutput};

pub(super) fn register(out: &mut Vec<(MetricDescriptor, Arc<dyn Metric>)>) {
    out.push((
        MetricDescriptor::new("utility.classification", MetricCategory::Utility)
            .requires(&[SemanticType::Categorical, SemanticType::Boolean])
            .needs_target()
            .lower_is_better()
            .describe("Accuracy gap of k-NN classifiers trained on real vs synthetic data"),
        Arc::new(Classification),
    ));
    out.push((
        MetricDescriptor::new("utility.regression", MetricCategory::Utility)
            .requires(&[SemanticType::Numerical])
            .needs_target()
            .lower_is_better()
            .describe("R\u{b2} gap of k-NN regressors trained on real vs synthetic data"),
        Arc::new(Regression),
    ));
}

/// Split real row indices into (train, holdout). Both sides keep at least
/// one row.
pub fn holdout_split(
    n_rows: usize,
    fraction: f64,
    seed: u64,
) -> Result<(Vec<usize>, Vec<usize>), MetricError> {
    if n_rows < 2 {
        return Err(MetricError::Computation(format!(
            "holdout split needs at least 2 real rows with a target, found {n_rows}"
        )));
    }
    let mut indices = (0..n_rows).collect::<Vec<_>>();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let holdout = ((n_rows as f64) * fraction).round() as usize;
    let holdout = holdout.clamp(1, n_rows - 1);
    let train = indices.split_off(holdout);
    Ok((train, indices))
}

/// Encoded features plus target for rows whose target is present.
struct Prepared<T> {
    rows: Vec<Vec<Cell>>,
    targets: Vec<T>,
}

struct Task<'a> {
    target: &'a ColumnSchema,
    space: FeatureSpace,
}

impl<'a> Task<'a> {
    fn new(
        input: &MetricInput<'a>,
        accepts: impl Fn(SemanticType) -> bool,
        kind: &str,
    ) -> Result<Self, MetricError> {
        let target = input.target()?;
        if input
            .columns
            .is_some_and(|allowed| !allowed.iter().any(|name| *name == target.name))
        {
            return Err(MetricError::InvalidTarget(format!(
                "column '{}' is outside the column restriction",
                target.name
            )));
        }
        if !accepts(target.semantic_type) {
            return Err(MetricError::InsufficientColumns(format!(
                "{} needs a {kind} target, '{}' is {}",
                input.metric_id, target.name, target.semantic_type
            )));
        }

        let features = input
            .in_scope()
            .filter(|column| column.name != target.name)
            .filter(|column| column.semantic_type != SemanticType::Text)
            .collect::<Vec<_>>();
        if features.is_empty() {
            return Err(MetricError::InsufficientColumns(format!(
                "{} needs at least one feature column besides '{}'",
                input.metric_id, target.name
            )));
        }

        Ok(Self {
            target,
            space: FeatureSpace::fit(&features, input.real)?,
        })
    }

    fn prepare<T>(
        &self,
        dataset: &Dataset,
        read: impl Fn(&Value) -> Option<T>,
    ) -> Result<Prepared<T>, MetricError> {
        let target = dataset.column(&self.target.name).ok_or_else(|| {
            MetricError::Computation(format!("target '{}' missing from dataset", self.target.name))
        })?;
        let encoded = self.space.encode(dataset)?;

        let mut rows = Vec::with_capacity(encoded.len());
        let mut targets = Vec::with_capacity(encoded.len());
        for (row, value) in encoded.into_iter().zip(&target.values) {
            if value.is_null() {
                continue;
            }
            if let Some(value) = read(value) {
                rows.push(row);
                targets.push(value);
            }
        }
        Ok(Prepared { rows, targets })
    }
}

fn pick<T: Clone>(prepared: &Prepared<T>, indices: &[usize]) -> Prepared<T> {
    Prepared {
        rows: indices.iter().map(|idx| prepared.rows[*idx].clone()).collect(),
        targets: indices.iter().map(|idx| prepared.targets[*idx].clone()).collect(),
    }
}

fn ensure_rows<T>(prepared: &Prepared<T>, which: &str) -> Result<(), MetricError> {
    if prepared.rows.is_empty() {
        return Err(MetricError::Computation(format!(
            "{which} dataset has no rows with a usable target"
        )));
    }
    Ok(())
}

pub struct Classification;

impl Classification {
    fn accuracy(
        space: &FeatureSpace,
        train: &Prepared<String>,
        holdout: &Prepared<String>,
        k: usize,
    ) -> f64 {
        let k = k.min(train.rows.len()).max(1);
        let correct = holdout
            .rows
            .iter()
            .zip(&holdout.targets)
            .filter(|(row, expected)| {
                let neighbours = space.k_nearest(row, &train.rows, k);
                majority_label(neighbours.iter().map(|idx| train.targets[*idx].as_str()))
                    == Some(expected.as_str())
            })
            .count();
        correct as f64 / holdout.rows.len().max(1) as f64
    }
}

impl Metric for Classification {
    fn compute(&self, input: &MetricInput<'_>) -> Result<MetricOutput, MetricError> {
        let task = Task::new(
            input,
            |semantic_type| semantic_type.is_discrete(),
            "categorical or boolean",
        )?;
        let semantic_type = task.target.semantic_type;
        let read = |value: &Value| label_of(value, semantic_type);

        let real = task.prepare(input.real, read)?;
        let synthetic = task.prepare(input.synthetic, read)?;
        ensure_rows(&synthetic, "synthetic")?;

        let (train_idx, holdout_idx) =
            holdout_split(real.rows.len(), input.params.holdout_fraction, input.params.seed)?;
        let train = pick(&real, &train_idx);
        let holdout = pick(&real, &holdout_idx);

        let k = input.params.neighbours;
        let real_accuracy = Self::accuracy(&task.space, &train, &holdout, k);
        let synthetic_accuracy = Self::accuracy(&task.space, &synthetic, &holdout, k);

        Ok(MetricOutput::new((real_accuracy - synthetic_accuracy).abs())
            .with_detail("real_accuracy", real_accuracy)
            .with_detail("synthetic_accuracy", synthetic_accuracy)
            .with_detail("holdout_rows", holdout.rows.len() as f64))
    }
}

pub struct Regression;

impl Regression {
    /// Holdout R², clamped to [0, 1].
    fn r_squared(
        space: &FeatureSpace,
        train: &Prepared<f64>,
        holdout: &Prepared<f64>,
        k: usize,
    ) -> f64 {
        let k = k.min(train.rows.len()).max(1);
        let predictions = holdout
            .rows
            .iter()
            .map(|row| {
                let neighbours = space
                    .k_nearest(row, &train.rows, k)
                    .into_iter()
                    .map(|idx| train.targets[idx])
                    .collect::<Vec<_>>();
                stats::mean(&neighbours).unwrap_or(0.0)
            })
            .collect::<Vec<_>>();

        let mean = stats::mean(&holdout.targets).unwrap_or(0.0);
        let ss_tot = holdout
            .targets
            .iter()
            .map(|value| (value - mean).powi(2))
            .sum::<f64>();
        let ss_res = holdout
            .targets
            .iter()
            .zip(&predictions)
            .map(|(value, predicted)| (value - predicted).powi(2))
            .sum::<f64>();

        let r2 = if ss_tot <= f64::EPSILON {
            if ss_res <= f64::EPSILON { 1.0 } else { 0.0 }
        } else {
            1.0 - ss_res / ss_tot
        };
        r2.clamp(0.0, 1.0)
    }
}

impl Metric for Regression {
    fn compute(&self, input: &MetricInput<'_>) -> Result<MetricOutput, MetricError> {
        let task = Task::new(
            input,
            |semantic_type| semantic_type == SemanticType::Numerical,
            "numerical",
        )?;
        let semantic_type = task.target.semantic_type;
        let read = |value: &Value| number_of(value, semantic_type);

        let real = task.prepare(input.real, read)?;
        let synthetic = task.prepare(input.synthetic, read)?;
        ensure_rows(&synthetic, "synthetic")?;

        let (train_idx, holdout_idx) =
            holdout_split(real.rows.len(), input.params.holdout_fraction, input.params.seed)?;
        let train = pick(&real, &train_idx);
        let holdout = pick(&real, &holdout_idx);

        let k = input.params.neighbours;
        let real_r2 = Self::r_squared(&task.space, &train, &holdout, k);
        let synthetic_r2 = Self::r_squared(&task.space, &synthetic, &holdout, k);

        Ok(MetricOutput::new((real_r2 - synthetic_r2).abs())
            .with_detail("real_r2", real_r2)
            .with_detail("synthetic_r2", synthetic_r2)
            .with_detail("holdout_rows", holdout.rows.len() as f64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_keeps_both_sides_non_empty() {
        let (train, holdout) = holdout_split(2, 0.9, 7).expect("split");
        assert_eq!(train.len(), 1);
        assert_eq!(holdout.len(), 1);

        let (train, holdout) = holdout_split(10, 0.3, 7).expect("split");
        assert_eq!(holdout.len(), 3);
        assert_eq!(train.len(), 7);
    }

    #[test]
    fn split_is_seeded() {
        assert_eq!(holdout_split(20, 0.3, 11).ok(), holdout_split(20, 0.3, 11).ok());
    }

    #[test]
    fn split_rejects_single_row() {
        assert!(matches!(holdout_split(1, 0.3, 1), Err(MetricError::Computation(_))));
    }
}
