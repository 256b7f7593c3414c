//! Range-scaled mixed-type distances and nearest-neighbour search.

use std::collections::BTreeMap;

use synthscope_core::{ColumnSchema, Dataset, SemanticType, Value};

use crate::errors::MetricError;
use crate::model::NeighbourDistance;

/// Encoded cell ready for distance computation.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Missing,
    Number(f64),
    Label(String),
}

/// Numeric reading of a continuous cell; datetimes become epoch seconds.
pub fn number_of(value: &Value, semantic_type: SemanticType) -> Option<f64> {
    match semantic_type {
        SemanticType::Datetime => value.as_epoch_seconds(),
        _ => value.as_f64(),
    }
}

/// Label of a discrete cell, `None` for nulls. Boolean columns are
/// canonicalized so `"true"` and `true` compare equal.
pub fn label_of(value: &Value, semantic_type: SemanticType) -> Option<String> {
    match (semantic_type, value.as_bool()) {
        (SemanticType::Boolean, Some(flag)) => Some(flag.to_string()),
        _ => value.key(),
    }
}

impl Cell {
    fn encode(value: &Value, semantic_type: SemanticType) -> Cell {
        if value.is_null() {
            return Cell::Missing;
        }
        if !semantic_type.is_continuous() {
            return label_of(value, semantic_type)
                .map(Cell::Label)
                .unwrap_or(Cell::Missing);
        }
        number_of(value, semantic_type)
            .map(Cell::Number)
            .unwrap_or(Cell::Missing)
    }

    pub fn number(&self) -> Option<f64> {
        match self {
            Cell::Number(value) => Some(*value),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
struct Feature {
    name: String,
    semantic_type: SemanticType,
    /// Value range over the real dataset, continuous features only.
    range: f64,
    weight: f64,
}

/// Feature layout fitted on the real dataset.
#[derive(Debug, Clone)]
pub struct FeatureSpace {
    features: Vec<Feature>,
    kind: NeighbourDistance,
}

impl FeatureSpace {
    pub fn fit(columns: &[&ColumnSchema], real: &Dataset) -> Result<Self, MetricError> {
        let mut features = Vec::with_capacity(columns.len());
        for column in columns {
            let values = real.column(&column.name).ok_or_else(|| {
                MetricError::Computation(format!("column '{}' missing from real dataset", column.name))
            })?;
            let range = if column.semantic_type.is_continuous() {
                let numbers = values
                    .values
                    .iter()
                    .filter_map(|value| Cell::encode(value, column.semantic_type).number())
                    .collect::<Vec<_>>();
                let min = numbers.iter().copied().fold(f64::INFINITY, f64::min);
                let max = numbers.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                if numbers.is_empty() { 0.0 } else { max - min }
            } else {
                0.0
            };
            features.push(Feature {
                name: column.name.clone(),
                semantic_type: column.semantic_type,
                range,
                weight: 1.0,
            });
        }
        Ok(Self {
            features,
            kind: NeighbourDistance::Gower,
        })
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn with_distance(mut self, kind: NeighbourDistance) -> Self {
        self.kind = kind;
        self
    }

    /// Replace feature weights, in feature order.
    pub fn with_weights(mut self, weights: &[f64]) -> Self {
        for (feature, weight) in self.features.iter_mut().zip(weights) {
            feature.weight = *weight;
        }
        self
    }

    /// Row-major encoding of `dataset` in feature order.
    pub fn encode(&self, dataset: &Dataset) -> Result<Vec<Vec<Cell>>, MetricError> {
        let columns = self
            .features
            .iter()
            .map(|feature| {
                dataset.column(&feature.name).ok_or_else(|| {
                    MetricError::Computation(format!("column '{}' missing from dataset", feature.name))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok((0..dataset.n_rows())
            .map(|row| {
                self.features
                    .iter()
                    .zip(&columns)
                    .map(|(feature, column)| Cell::encode(&column.values[row], feature.semantic_type))
                    .collect()
            })
            .collect())
    }

    /// Column-wise view of encoded rows for one feature.
    pub fn feature_cells<'r>(&self, rows: &'r [Vec<Cell>], index: usize) -> Vec<&'r Cell> {
        rows.iter().filter_map(|row| row.get(index)).collect()
    }

    /// Distance in [0, 1]: the weighted mean of per-feature dissimilarities
    /// (Gower), or the root of their weighted mean square (Euclid).
    pub fn distance(&self, a: &[Cell], b: &[Cell]) -> f64 {
        let mut weighted = 0.0;
        let mut total = 0.0;
        for ((feature, x), y) in self.features.iter().zip(a).zip(b) {
            let d = dissimilarity(feature, x, y);
            weighted += feature.weight
                * match self.kind {
                    NeighbourDistance::Gower => d,
                    NeighbourDistance::Euclid => d * d,
                };
            total += feature.weight;
        }
        if total <= 0.0 {
            return 0.0;
        }
        match self.kind {
            NeighbourDistance::Gower => weighted / total,
            NeighbourDistance::Euclid => (weighted / total).sqrt(),
        }
    }

    /// For every row in `from`, distance to its nearest row in `to`.
    /// With `exclude_self` the same index is skipped (`from` and `to` are the
    /// same rows).
    pub fn nearest(&self, from: &[Vec<Cell>], to: &[Vec<Cell>], exclude_self: bool) -> Vec<f64> {
        from.iter()
            .enumerate()
            .map(|(i, row)| {
                to.iter()
                    .enumerate()
                    .filter(|(j, _)| !(exclude_self && i == *j))
                    .map(|(_, other)| self.distance(row, other))
                    .fold(f64::INFINITY, f64::min)
            })
            .collect()
    }

    /// Indices of the `k` nearest training rows, ties broken by index.
    pub fn k_nearest(&self, query: &[Cell], train: &[Vec<Cell>], k: usize) -> Vec<usize> {
        let mut scored = train
            .iter()
            .enumerate()
            .map(|(idx, row)| (self.distance(query, row), idx))
            .collect::<Vec<_>>();
        scored.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        scored.into_iter().take(k).map(|(_, idx)| idx).collect()
    }
}

fn dissimilarity(feature: &Feature, a: &Cell, b: &Cell) -> f64 {
    match (a, b) {
        (Cell::Missing, Cell::Missing) => 0.0,
        (Cell::Missing, _) | (_, Cell::Missing) => 1.0,
        (Cell::Number(x), Cell::Number(y)) => {
            if feature.range > 0.0 {
                ((x - y).abs() / feature.range).min(1.0)
            } else if x == y {
                0.0
            } else {
                1.0
            }
        }
        (Cell::Label(x), Cell::Label(y)) => {
            if x == y {
                0.0
            } else {
                1.0
            }
        }
        _ => 1.0,
    }
}

/// Majority label among the neighbours; ties go to the smallest label.
pub fn majority_label<'a>(labels: impl IntoIterator<Item = &'a str>) -> Option<&'a str> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for label in labels {
        *counts.entry(label).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .fold(None, |best: Option<(&str, usize)>, (label, count)| match best {
            Some((_, best_count)) if best_count >= count => best,
            _ => Some((label, count)),
        })
        .map(|(label, _)| label)
}

#[cfg(test)]
mod tests {
    use super::*;
    use synthscope_core::Column;

    fn schema_entry(name: &str, semantic_type: SemanticType) -> ColumnSchema {
        ColumnSchema {
            name: name.to_string(),
            semantic_type,
            nullable: false,
            null_count: 0,
            distinct_count: 0,
        }
    }

    fn space() -> (FeatureSpace, Vec<Vec<Cell>>) {
        let real = Dataset::new(vec![
            Column::new("x", vec![Value::Int(0), Value::Int(10), Value::Int(5)]),
            Column::new("c", vec![Value::from("a"), Value::from("b"), Value::from("a")]),
        ])
        .expect("dataset");
        let x = schema_entry("x", SemanticType::Numerical);
        let c = schema_entry("c", SemanticType::Categorical);
        let space = FeatureSpace::fit(&[&x, &c], &real).expect("fit");
        let rows = space.encode(&real).expect("encode");
        (space, rows)
    }

    #[test]
    fn distance_mixes_numeric_and_labels() {
        let (space, rows) = space();
        assert_eq!(space.distance(&rows[0], &rows[0]), 0.0);
        // |0-10|/10 = 1, a != b -> (1 + 1) / 2
        assert!((space.distance(&rows[0], &rows[1]) - 1.0).abs() < 1e-12);
        // |0-5|/10 = 0.5, a == a -> 0.25
        assert!((space.distance(&rows[0], &rows[2]) - 0.25).abs() < 1e-12);
    }

    #[test]
    fn euclid_takes_root_mean_square() {
        let (space, rows) = space();
        let space = space.with_distance(NeighbourDistance::Euclid);
        assert!((space.distance(&rows[0], &rows[1]) - 1.0).abs() < 1e-12);
        // sqrt((0.5^2 + 0^2) / 2)
        assert!((space.distance(&rows[0], &rows[2]) - 0.125_f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn null_labels_are_missing() {
        let (space, _) = space();
        let real = Dataset::new(vec![
            Column::new("x", vec![Value::Int(0)]),
            Column::new("c", vec![Value::Null]),
        ])
        .expect("dataset");
        let rows = space.encode(&real).expect("encode");
        assert_eq!(rows[0][1], Cell::Missing);
    }

    #[test]
    fn nearest_excludes_self_when_asked() {
        let (space, rows) = space();
        let with_self = space.nearest(&rows, &rows, false);
        assert!(with_self.iter().all(|distance| *distance == 0.0));
        let without_self = space.nearest(&rows, &rows, true);
        assert!((without_self[0] - 0.25).abs() < 1e-12);
    }

    #[test]
    fn k_nearest_orders_by_distance() {
        let (space, rows) = space();
        assert_eq!(space.k_nearest(&rows[0], &rows, 2), vec![0, 2]);
    }

    #[test]
    fn majority_breaks_ties_by_label() {
        assert_eq!(majority_label(["b", "a", "b", "a"]), Some("a"));
        assert_eq!(majority_label(["b", "b", "a"]), Some("b"));
        assert_eq!(majority_label([]), None);
    }
}
