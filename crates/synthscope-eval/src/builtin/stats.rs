//! Numeric helpers shared by the built-in metrics.

use std::collections::{BTreeMap, BTreeSet};

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Two-sample Kolmogorov-Smirnov statistic. An empty sample is maximally
/// distant from a non-empty one.
pub fn ks_statistic(a: &[f64], b: &[f64]) -> f64 {
    match (a.is_empty(), b.is_empty()) {
        (true, true) => return 0.0,
        (true, false) | (false, true) => return 1.0,
        _ => {}
    }

    let mut a = a.to_vec();
    let mut b = b.to_vec();
    a.sort_by(f64::total_cmp);
    b.sort_by(f64::total_cmp);

    let (n_a, n_b) = (a.len() as f64, b.len() as f64);
    let (mut i, mut j) = (0usize, 0usize);
    let mut statistic = 0.0_f64;

    while i < a.len() && j < b.len() {
        let value = a[i].min(b[j]);
        while i < a.len() && a[i] <= value {
            i += 1;
        }
        while j < b.len() && b[j] <= value {
            j += 1;
        }
        statistic = statistic.max((i as f64 / n_a - j as f64 / n_b).abs());
    }

    statistic
}

/// Relative frequency of each key.
pub fn frequencies<'a>(keys: impl IntoIterator<Item = &'a str>) -> BTreeMap<&'a str, f64> {
    let mut counts = BTreeMap::new();
    let mut total = 0usize;
    for key in keys {
        *counts.entry(key).or_insert(0usize) += 1;
        total += 1;
    }
    counts
        .into_iter()
        .map(|(key, count)| (key, count as f64 / total.max(1) as f64))
        .collect()
}

/// Total variation distance between two discrete distributions.
pub fn total_variation(p: &BTreeMap<&str, f64>, q: &BTreeMap<&str, f64>) -> f64 {
    let keys = p.keys().chain(q.keys()).collect::<BTreeSet<_>>();
    let sum = keys
        .into_iter()
        .map(|key| (p.get(key).unwrap_or(&0.0) - q.get(key).unwrap_or(&0.0)).abs())
        .sum::<f64>();
    0.5 * sum
}

/// Pearson correlation; 0 when either side is constant.
pub fn pearson(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len().min(y.len());
    if n < 2 {
        return 0.0;
    }
    let (x, y) = (&x[..n], &y[..n]);
    let mean_x = x.iter().sum::<f64>() / n as f64;
    let mean_y = y.iter().sum::<f64>() / n as f64;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (a, b) in x.iter().zip(y) {
        let (dx, dy) = (a - mean_x, b - mean_y);
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x <= f64::EPSILON || var_y <= f64::EPSILON {
        0.0
    } else {
        (cov / (var_x.sqrt() * var_y.sqrt())).clamp(-1.0, 1.0)
    }
}

/// Squared Cramér's V (`chi2 / (n * (min(r, c) - 1))`) without continuity
/// correction.
pub fn cramers_v2(a: &[&str], b: &[&str]) -> f64 {
    let n = a.len().min(b.len());
    if n == 0 {
        return 0.0;
    }

    let mut table: BTreeMap<(&str, &str), f64> = BTreeMap::new();
    let mut rows: BTreeMap<&str, f64> = BTreeMap::new();
    let mut cols: BTreeMap<&str, f64> = BTreeMap::new();
    for (&x, &y) in a.iter().zip(b.iter()).take(n) {
        *table.entry((x, y)).or_insert(0.0) += 1.0;
        *rows.entry(x).or_insert(0.0) += 1.0;
        *cols.entry(y).or_insert(0.0) += 1.0;
    }

    let mini = rows.len().min(cols.len()).saturating_sub(1);
    if mini == 0 {
        return 0.0;
    }

    let total = n as f64;
    let mut chi2 = 0.0;
    for (row, row_sum) in &rows {
        for (col, col_sum) in &cols {
            let expected = row_sum * col_sum / total;
            let observed = table.get(&(*row, *col)).copied().unwrap_or(0.0);
            chi2 += (observed - expected).powi(2) / expected;
        }
    }

    (chi2 / (total * mini as f64)).clamp(0.0, 1.0)
}

/// Correlation ratio η² of a numeric measurement grouped by category.
pub fn correlation_ratio(categories: &[&str], measurements: &[f64]) -> f64 {
    let n = categories.len().min(measurements.len());
    if n == 0 {
        return 0.0;
    }

    let mut groups: BTreeMap<&str, (f64, f64)> = BTreeMap::new();
    for (&category, &value) in categories.iter().zip(measurements.iter()).take(n) {
        let group = groups.entry(category).or_insert((0.0, 0.0));
        group.0 += value;
        group.1 += 1.0;
    }

    let total_mean = measurements[..n].iter().sum::<f64>() / n as f64;
    let numerator = groups
        .values()
        .map(|(sum, count)| count * (sum / count - total_mean).powi(2))
        .sum::<f64>();
    let denominator = measurements[..n]
        .iter()
        .map(|value| (value - total_mean).powi(2))
        .sum::<f64>();

    if numerator == 0.0 || denominator <= f64::EPSILON {
        0.0
    } else {
        (numerator / denominator).clamp(0.0, 1.0)
    }
}

/// Linear-interpolated percentile, `q` in [0, 100].
pub fn percentile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let rank = (q.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let fraction = rank - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * fraction)
}

/// Shannon entropy (natural log) of a sequence of labels.
pub fn entropy<'a>(labels: impl IntoIterator<Item = &'a str>) -> f64 {
    frequencies(labels)
        .values()
        .filter(|p| **p > 0.0)
        .map(|p| -p * p.ln())
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn ks_is_zero_for_identical_samples() {
        let sample = [1.0, 2.0, 2.0, 3.0, 5.0];
        assert!(approx(ks_statistic(&sample, &sample), 0.0));
    }

    #[test]
    fn ks_is_one_for_disjoint_samples() {
        assert!(approx(ks_statistic(&[1.0, 2.0], &[10.0, 11.0]), 1.0));
        assert!(approx(ks_statistic(&[1.0], &[]), 1.0));
    }

    #[test]
    fn ks_matches_hand_computed_value() {
        // F_a jumps at 1,2,3,4 ; F_b jumps at 3,4,5,6 -> max gap 0.5 at 2
        assert!(approx(
            ks_statistic(&[1.0, 2.0, 3.0, 4.0], &[3.0, 4.0, 5.0, 6.0]),
            0.5
        ));
    }

    #[test]
    fn total_variation_bounds() {
        let p = frequencies(["a", "a", "b"]);
        let q = frequencies(["x", "y"]);
        assert!(approx(total_variation(&p, &p), 0.0));
        assert!(approx(total_variation(&p, &q), 1.0));
    }

    #[test]
    fn pearson_detects_linear_relation() {
        let x = [1.0, 2.0, 3.0, 4.0];
        let y = [2.0, 4.0, 6.0, 8.0];
        assert!(approx(pearson(&x, &y), 1.0));
        assert!(approx(pearson(&x, &[1.0, 1.0, 1.0, 1.0]), 0.0));
    }

    #[test]
    fn cramers_v2_for_perfect_association() {
        let a = ["x", "x", "y", "y"];
        let b = ["p", "p", "q", "q"];
        assert!(approx(cramers_v2(&a, &b), 1.0));
        assert!(approx(cramers_v2(&a, &["p", "p", "p", "p"]), 0.0));
    }

    #[test]
    fn correlation_ratio_for_separated_groups() {
        let categories = ["a", "a", "b", "b"];
        assert!(approx(correlation_ratio(&categories, &[1.0, 1.0, 5.0, 5.0]), 1.0));
        assert!(approx(correlation_ratio(&categories, &[1.0, 5.0, 1.0, 5.0]), 0.0));
    }

    #[test]
    fn percentile_interpolates() {
        let values = [0.0, 10.0, 20.0, 30.0, 40.0];
        assert_eq!(percentile(&values, 50.0), Some(20.0));
        assert_eq!(percentile(&values, 5.0), Some(2.0));
        assert_eq!(percentile(&[], 5.0), None);
    }

    #[test]
    fn entropy_of_uniform_labels() {
        assert!(approx(entropy(["a", "b"]), 2.0_f64.ln()));
        assert!(approx(entropy(["a", "a"]), 0.0));
    }
}
