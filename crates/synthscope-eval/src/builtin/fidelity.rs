use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use synthscope_core::{Column, ColumnSchema, SemanticType};

use crate::builtin::distance::{label_of, number_of};
use crate::builtin::stats;
use crate::descriptor::{MetricCategory, MetricDescriptor, ScoreScale};
use crate::errors::MetricError;
use crate::metric::{Metric, MetricInput, MetricOutput};

pub(super) fn register(out: &mut Vec<(MetricDescriptor, Arc<dyn Metric>)>) {
    out.push((
        MetricDescriptor::new("fidelity.ks_distance", MetricCategory::Fidelity)
            .requires(&[SemanticType::Numerical, SemanticType::Datetime])
            .lower_is_better()
            .describe("Mean two-sample Kolmogorov-Smirnov statistic over continuous columns"),
        Arc::new(KsDistance),
    ));
    out.push((
        MetricDescriptor::new("fidelity.tv_distance", MetricCategory::Fidelity)
            .requires(&[SemanticType::Categorical, SemanticType::Boolean])
            .lower_is_better()
            .describe("Mean total variation distance of category frequencies"),
        Arc::new(TvDistance),
    ));
    out.push((
        MetricDescriptor::new("fidelity.category_coverage", MetricCategory::Fidelity)
            .requires(&[SemanticType::Categorical, SemanticType::Boolean])
            .weight(0.5)
            .describe("Mean share of real categories that appear in the synthetic data"),
        Arc::new(CategoryCoverage),
    ));
    out.push((
        MetricDescriptor::new("fidelity.corr_diff", MetricCategory::Fidelity)
            .requires(&[
                SemanticType::Numerical,
                SemanticType::Categorical,
                SemanticType::Boolean,
            ])
            .scale(ScoreScale::Saturating)
            .lower_is_better()
            .describe("Frobenius norm of the difference between mixed correlation matrices"),
        Arc::new(CorrelationDifference),
    ));
}

fn is_discrete(semantic_type: SemanticType) -> bool {
    semantic_type.is_discrete()
}

fn continuous_values(column: &Column, semantic_type: SemanticType) -> Vec<f64> {
    column
        .non_null()
        .filter_map(|value| number_of(value, semantic_type))
        .collect()
}

/// Category labels of a column. Nulls are not a category.
fn labels(column: &Column, semantic_type: SemanticType) -> Vec<String> {
    column
        .values
        .iter()
        .filter_map(|value| label_of(value, semantic_type))
        .collect()
}

/// Mean of the per-column scores, each recorded as a detail.
fn per_column(
    input: &MetricInput<'_>,
    columns: &[&ColumnSchema],
    score: impl Fn(&Column, &Column, SemanticType) -> f64,
) -> Result<MetricOutput, MetricError> {
    let mut details = BTreeMap::new();
    for column in columns {
        let real = input.real_column(&column.name)?;
        let synthetic = input.synthetic_column(&column.name)?;
        details.insert(column.name.clone(), score(real, synthetic, column.semantic_type));
    }
    let values = details.values().copied().collect::<Vec<_>>();
    let mean = stats::mean(&values)
        .ok_or_else(|| MetricError::Computation("no column scores".to_string()))?;
    Ok(MetricOutput::new(mean).with_details(details))
}

pub struct KsDistance;

impl Metric for KsDistance {
    fn compute(&self, input: &MetricInput<'_>) -> Result<MetricOutput, MetricError> {
        let columns = input.require_columns(
            |semantic_type| semantic_type.is_continuous(),
            1,
            "at least one numerical or datetime column",
        )?;
        per_column(input, &columns, |real, synthetic, semantic_type| {
            stats::ks_statistic(
                &continuous_values(real, semantic_type),
                &continuous_values(synthetic, semantic_type),
            )
        })
    }
}

pub struct TvDistance;

impl Metric for TvDistance {
    fn compute(&self, input: &MetricInput<'_>) -> Result<MetricOutput, MetricError> {
        let columns = input.require_columns(
            is_discrete,
            1,
            "at least one categorical or boolean column",
        )?;
        per_column(input, &columns, |real, synthetic, semantic_type| {
            let real = labels(real, semantic_type);
            let synthetic = labels(synthetic, semantic_type);
            stats::total_variation(
                &stats::frequencies(real.iter().map(String::as_str)),
                &stats::frequencies(synthetic.iter().map(String::as_str)),
            )
        })
    }
}

pub struct CategoryCoverage;

impl Metric for CategoryCoverage {
    fn compute(&self, input: &MetricInput<'_>) -> Result<MetricOutput, MetricError> {
        let columns = input.require_columns(
            is_discrete,
            1,
            "at least one categorical or boolean column",
        )?;
        per_column(input, &columns, |real, synthetic, semantic_type| {
            let expected = labels(real, semantic_type)
                .into_iter()
                .collect::<BTreeSet<_>>();
            if expected.is_empty() {
                return 1.0;
            }
            let present = labels(synthetic, semantic_type)
                .into_iter()
                .collect::<BTreeSet<_>>();
            expected.intersection(&present).count() as f64 / expected.len() as f64
        })
    }
}

pub struct CorrelationDifference;

impl Metric for CorrelationDifference {
    fn compute(&self, input: &MetricInput<'_>) -> Result<MetricOutput, MetricError> {
        let columns = if input.params.corr_numeric_only {
            input.require_columns(
                |semantic_type| semantic_type == SemanticType::Numerical,
                2,
                "at least two numerical columns",
            )?
        } else {
            input.require_columns(
                |semantic_type| {
                    matches!(
                        semantic_type,
                        SemanticType::Numerical | SemanticType::Categorical | SemanticType::Boolean
                    )
                },
                2,
                "at least two numerical, categorical or boolean columns",
            )?
        };

        let mut real = Vec::with_capacity(columns.len());
        let mut synthetic = Vec::with_capacity(columns.len());
        for column in &columns {
            real.push(input.real_column(&column.name)?);
            synthetic.push(input.synthetic_column(&column.name)?);
        }
        let real = correlation_matrix(&columns, &real);
        let synthetic = correlation_matrix(&columns, &synthetic);

        let mut total = 0.0;
        let mut details = BTreeMap::new();
        for (i, column) in columns.iter().enumerate() {
            let row = (0..columns.len())
                .map(|j| (real[i][j] - synthetic[i][j]).powi(2))
                .sum::<f64>();
            total += row;
            details.insert(column.name.clone(), row.sqrt());
        }

        Ok(MetricOutput::new(total.sqrt()).with_details(details))
    }
}

/// Mixed association matrix: Pearson for numeric pairs, Cramér's V² for
/// discrete pairs and η² for discrete/numeric pairs. Rows with a null on
/// either side are dropped pairwise.
fn correlation_matrix(schema: &[&ColumnSchema], columns: &[&Column]) -> Vec<Vec<f64>> {
    let n = columns.len();
    let mut matrix = vec![vec![0.0; n]; n];
    for i in 0..n {
        matrix[i][i] = 1.0;
        for j in (i + 1)..n {
            let value = association(schema[i], columns[i], schema[j], columns[j]);
            matrix[i][j] = value;
            matrix[j][i] = value;
        }
    }
    matrix
}

fn association(
    left_schema: &ColumnSchema,
    left: &Column,
    right_schema: &ColumnSchema,
    right: &Column,
) -> f64 {
    let rows = left
        .values
        .iter()
        .zip(&right.values)
        .filter(|(a, b)| !a.is_null() && !b.is_null());

    match (
        left_schema.semantic_type.is_discrete(),
        right_schema.semantic_type.is_discrete(),
    ) {
        (false, false) => {
            let (x, y): (Vec<f64>, Vec<f64>) = rows
                .filter_map(|(a, b)| {
                    Some((
                        number_of(a, left_schema.semantic_type)?,
                        number_of(b, right_schema.semantic_type)?,
                    ))
                })
                .unzip();
            stats::pearson(&x, &y)
        }
        (true, true) => {
            let (x, y): (Vec<String>, Vec<String>) = rows
                .filter_map(|(a, b)| {
                    Some((
                        label_of(a, left_schema.semantic_type)?,
                        label_of(b, right_schema.semantic_type)?,
                    ))
                })
                .unzip();
            let x = x.iter().map(String::as_str).collect::<Vec<_>>();
            let y = y.iter().map(String::as_str).collect::<Vec<_>>();
            stats::cramers_v2(&x, &y)
        }
        (true, false) => {
            let (categories, measurements): (Vec<String>, Vec<f64>) = rows
                .filter_map(|(a, b)| {
                    Some((
                        label_of(a, left_schema.semantic_type)?,
                        number_of(b, right_schema.semantic_type)?,
                    ))
                })
                .unzip();
            let categories = categories.iter().map(String::as_str).collect::<Vec<_>>();
            stats::correlation_ratio(&categories, &measurements)
        }
        (false, true) => {
            let (categories, measurements): (Vec<String>, Vec<f64>) = rows
                .filter_map(|(a, b)| {
                    Some((
                        label_of(b, right_schema.semantic_type)?,
                        number_of(a, left_schema.semantic_type)?,
                    ))
                })
                .unzip();
            let categories = categories.iter().map(String::as_str).collect::<Vec<_>>();
            stats::correlation_ratio(&categories, &measurements)
        }
    }
}
