use std::collections::BTreeMap;

use synthscope_core::Schema;

use crate::descriptor::{MetricCategory, MetricDescriptor};
use crate::metrics::{MetricEntry, Report, ReportMeta};
use crate::model::{EvaluateOptions, MetricResult, MetricStatus};

/// Combines per-metric results into category and overall scores.
///
/// Only `ok` results contribute. A category without any contributing
/// weight is reported as undefined rather than zero.
#[derive(Debug, Clone, Default)]
pub struct Aggregator {
    metric_weights: BTreeMap<String, f64>,
    category_weights: BTreeMap<MetricCategory, f64>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_options(options: &EvaluateOptions) -> Self {
        Self {
            metric_weights: options.weights.clone(),
            category_weights: options.resolved_category_weights(),
        }
    }

    pub fn with_metric_weight(mut self, metric_id: impl Into<String>, weight: f64) -> Self {
        self.metric_weights.insert(metric_id.into(), weight);
        self
    }

    pub fn with_category_weight(mut self, category: MetricCategory, weight: f64) -> Self {
        self.category_weights.insert(category, weight);
        self
    }

    pub fn aggregate(
        &self,
        results: &[MetricResult],
        descriptors: &[MetricDescriptor],
        meta: ReportMeta,
        schema: Schema,
    ) -> Report {
        let lookup = descriptors
            .iter()
            .map(|descriptor| (descriptor.id.as_str(), descriptor))
            .collect::<BTreeMap<_, _>>();

        let mut metrics = results
            .iter()
            .map(|result| self.entry(result, lookup.get(result.metric.as_str()).copied()))
            .collect::<Vec<_>>();
        metrics.sort_by(|a, b| (a.category, &a.name).cmp(&(b.category, &b.name)));

        let mut sums: BTreeMap<MetricCategory, (f64, f64)> = BTreeMap::new();
        for entry in &metrics {
            let totals = sums.entry(entry.category).or_insert((0.0, 0.0));
            if let Some(normalized) = entry.normalized {
                totals.0 += entry.weight * normalized;
                totals.1 += entry.weight;
            }
        }

        let categories = sums
            .into_iter()
            .map(|(category, (weighted, weight))| (category, weighted_mean(weighted, weight)))
            .collect::<BTreeMap<_, _>>();

        let (weighted, weight) = categories
            .iter()
            .filter_map(|(category, score)| score.map(|score| (*category, score)))
            .fold((0.0, 0.0), |(weighted, total), (category, score)| {
                let weight = self.category_weight(category);
                (weighted + weight * score, total + weight)
            });

        Report {
            metrics,
            categories,
            overall: weighted_mean(weighted, weight),
            meta,
            schema,
        }
    }

    fn entry(&self, result: &MetricResult, descriptor: Option<&MetricDescriptor>) -> MetricEntry {
        let weight = self
            .metric_weights
            .get(&result.metric)
            .copied()
            .or(descriptor.map(|descriptor| descriptor.default_weight))
            .unwrap_or(0.0);
        let normalized = match (result.status, result.score, descriptor) {
            (MetricStatus::Ok, Some(score), Some(descriptor)) if score.is_finite() => {
                Some(descriptor.normalize(score))
            }
            _ => None,
        };

        MetricEntry {
            name: result.metric.clone(),
            category: result.category,
            status: result.status,
            score: result.score,
            normalized,
            weight,
            details: result.details.clone(),
            error: result.error.clone(),
        }
    }

    fn category_weight(&self, category: MetricCategory) -> f64 {
        self.category_weights.get(&category).copied().unwrap_or(1.0)
    }
}

fn weighted_mean(weighted: f64, weight: f64) -> Option<f64> {
    if weight > 0.0 {
        Some(weighted / weight)
    } else {
        None
    }
}
