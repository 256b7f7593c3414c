use synthscope_core::{Column, Dataset, Value};
use synthscope_eval::{EvaluateOptions, EvaluationEngine, MetricStatus, NeighbourDistance, Report};

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

fn ints(values: &[i64]) -> Vec<Value> {
    values.iter().map(|value| Value::Int(*value)).collect()
}

fn texts(values: &[&str]) -> Vec<Value> {
    values.iter().map(|value| Value::from(*value)).collect()
}

fn table(columns: Vec<(&str, Vec<Value>)>) -> Dataset {
    Dataset::new(
        columns
            .into_iter()
            .map(|(name, values)| Column::new(name, values))
            .collect(),
    )
    .expect("valid dataset")
}

/// Options under which small integer columns profile as numerical.
fn small_table_options() -> EvaluateOptions {
    let mut options = EvaluateOptions::default();
    options.profile.numeric_distinct_threshold = 1;
    options
}

fn run(options: EvaluateOptions, real: Dataset, synthetic: Dataset, metric: &str) -> Report {
    EvaluationEngine::with_builtins(options)
        .run(real, synthetic, &[metric])
        .expect("run completes")
}

fn city_for(age: i64) -> &'static str {
    match age {
        ..27 => "north",
        27..34 => "south",
        _ => "east",
    }
}

fn people(ages: std::ops::RangeInclusive<i64>, city: impl Fn(i64) -> String) -> Dataset {
    let ages = ages.collect::<Vec<_>>();
    table(vec![
        ("age", ints(&ages)),
        ("city", ages.iter().map(|age| Value::Text(city(*age))).collect()),
    ])
}

fn real_people() -> Dataset {
    people(20..=40, |age| city_for(age).to_string())
}

// x/y linear, c/d aligned; the synthetic side flips y and shuffles d.
fn correlated_pair() -> (Dataset, Dataset) {
    let real = table(vec![
        ("x", ints(&[1, 2, 3, 4])),
        ("y", ints(&[2, 4, 6, 8])),
        ("c", texts(&["p", "p", "q", "q"])),
        ("d", texts(&["u", "u", "v", "v"])),
    ]);
    let synthetic = table(vec![
        ("x", ints(&[1, 2, 3, 4])),
        ("y", ints(&[8, 6, 4, 2])),
        ("c", texts(&["p", "p", "q", "q"])),
        ("d", texts(&["u", "v", "u", "v"])),
    ]);
    (real, synthetic)
}

#[test]
fn corr_diff_matches_hand_computed_matrix() {
    let (real, synthetic) = correlated_pair();
    let report = run(small_table_options(), real, synthetic, "fidelity.corr_diff");
    let entry = report.metric("fidelity.corr_diff").expect("entry");
    assert_eq!(entry.status, MetricStatus::Ok);

    // Pearson(x, y): 1 -> -1, Cramér V²(c, d): 1 -> 0,
    // η²(d, x) and η²(d, y): 0.8 -> 0.2, η²(c, *) unchanged.
    let expected = (2.0 * 4.0 + 2.0 * 1.0 + 4.0 * 0.36_f64).sqrt();
    assert!(approx(entry.score.expect("score"), expected));
    assert!(approx(entry.details["x"], 4.36_f64.sqrt()));
    assert!(approx(entry.details["y"], 4.36_f64.sqrt()));
    assert!(approx(entry.details["c"], 1.0));
    assert!(approx(entry.details["d"], 1.72_f64.sqrt()));
}

#[test]
fn corr_diff_numeric_only_uses_pearson_on_numbers() {
    let (real, synthetic) = correlated_pair();
    let options = EvaluateOptions {
        corr_numeric_only: true,
        ..small_table_options()
    };
    let report = run(options, real, synthetic, "fidelity.corr_diff");
    let entry = report.metric("fidelity.corr_diff").expect("entry");

    assert!(approx(entry.score.expect("score"), 8.0_f64.sqrt()));
    assert_eq!(entry.details.keys().collect::<Vec<_>>(), vec!["x", "y"]);
}

#[test]
fn corr_diff_numeric_only_skips_without_two_numbers() {
    let real = table(vec![
        ("x", ints(&[1, 2, 3, 4])),
        ("c", texts(&["p", "p", "q", "q"])),
    ]);
    let options = EvaluateOptions {
        corr_numeric_only: true,
        ..small_table_options()
    };
    let report = run(options, real.clone(), real, "fidelity.corr_diff");
    assert_eq!(
        report.metric("fidelity.corr_diff").map(|entry| entry.status),
        Some(MetricStatus::Skipped)
    );
}

#[test]
fn eps_identifiability_on_identical_data_flags_every_record() {
    let report = run(
        EvaluateOptions::default(),
        real_people(),
        real_people(),
        "privacy.eps_identifiability",
    );
    let entry = report.metric("privacy.eps_identifiability").expect("entry");
    assert_eq!(entry.status, MetricStatus::Ok);
    assert_eq!(entry.score, Some(1.0));
    assert_eq!(entry.details["identifiable_records"], 21.0);
}

#[test]
fn eps_identifiability_on_disjoint_data_is_zero() {
    let synthetic = people(100..=120, |_| "west".to_string());
    let report = run(
        EvaluateOptions::default(),
        real_people(),
        synthetic,
        "privacy.eps_identifiability",
    );
    let entry = report.metric("privacy.eps_identifiability").expect("entry");
    assert_eq!(entry.score, Some(0.0));
    assert_eq!(entry.normalized, Some(1.0));
}

#[test]
fn euclid_distance_ignores_categorical_columns() {
    let relabelled = || people(20..=40, |age| format!("unseen-{}", city_for(age)));

    let mixed = run(
        EvaluateOptions::default(),
        real_people(),
        relabelled(),
        "privacy.eps_identifiability",
    );
    assert_eq!(
        mixed.metric("privacy.eps_identifiability").and_then(|entry| entry.score),
        Some(0.0)
    );

    let options = EvaluateOptions {
        distance: NeighbourDistance::Euclid,
        ..EvaluateOptions::default()
    };
    let numeric = run(options, real_people(), relabelled(), "privacy.eps_identifiability");
    assert_eq!(
        numeric.metric("privacy.eps_identifiability").and_then(|entry| entry.score),
        Some(1.0)
    );
}

#[test]
fn euclid_distance_needs_a_numerical_column() {
    let cities = table(vec![("city", texts(&["a", "b", "a", "b"]))]);
    let options = EvaluateOptions {
        distance: NeighbourDistance::Euclid,
        ..EvaluateOptions::default()
    };
    let report = EvaluationEngine::with_builtins(options)
        .run(cities.clone(), cities, &["privacy"])
        .expect("run completes");
    assert_eq!(report.count_status(MetricStatus::Skipped), 2);
}

fn grouped(values: [i64; 2]) -> Dataset {
    let groups = (0..20)
        .map(|idx| if idx % 2 == 0 { "a" } else { "b" })
        .collect::<Vec<_>>();
    let targets = groups
        .iter()
        .map(|group| if *group == "a" { values[0] } else { values[1] })
        .collect::<Vec<_>>();
    table(vec![("x", texts(&groups)), ("y", ints(&targets))])
}

fn regression_options() -> EvaluateOptions {
    EvaluateOptions {
        target_column: Some("y".to_string()),
        neighbours: 3,
        ..small_table_options()
    }
}

#[test]
fn regression_scores_a_faithful_copy_as_zero_gap() {
    let report = run(
        regression_options(),
        grouped([10, 20]),
        grouped([10, 20]),
        "utility.regression",
    );
    let entry = report.metric("utility.regression").expect("entry");
    assert_eq!(entry.status, MetricStatus::Ok);
    assert_eq!(entry.score, Some(0.0));
    assert_eq!(entry.details["real_r2"], 1.0);
    assert_eq!(entry.details["synthetic_r2"], 1.0);
    assert_eq!(entry.details["holdout_rows"], 6.0);
}

#[test]
fn regression_detects_a_swapped_relation() {
    let report = run(
        regression_options(),
        grouped([10, 20]),
        grouped([20, 10]),
        "utility.regression",
    );
    let entry = report.metric("utility.regression").expect("entry");
    assert_eq!(entry.status, MetricStatus::Ok);
    assert_eq!(entry.details["real_r2"], 1.0);
    assert_eq!(entry.details["synthetic_r2"], 0.0);
    assert_eq!(entry.score, Some(1.0));
}

#[test]
fn nulls_are_not_a_category() {
    let real = table(vec![("city", texts(&["a", "a", "b", "b"]))]);
    let synthetic = table(vec![(
        "city",
        vec![Value::from("a"), Value::from("b"), Value::Null, Value::Null],
    )]);
    let report = EvaluationEngine::with_builtins(EvaluateOptions::default())
        .run(
            real,
            synthetic,
            &["fidelity.tv_distance", "fidelity.category_coverage"],
        )
        .expect("run completes");

    assert_eq!(
        report.metric("fidelity.tv_distance").and_then(|entry| entry.score),
        Some(0.0)
    );
    assert_eq!(
        report.metric("fidelity.category_coverage").and_then(|entry| entry.score),
        Some(1.0)
    );
}

#[test]
fn null_text_label_differs_from_a_null_cell() {
    let real = table(vec![("city", texts(&["null", "null", "a", "a"]))]);
    let synthetic = table(vec![(
        "city",
        vec![Value::Null, Value::Null, Value::from("a"), Value::from("a")],
    )]);
    let report = EvaluationEngine::with_builtins(EvaluateOptions::default())
        .run(
            real,
            synthetic,
            &["fidelity.tv_distance", "fidelity.category_coverage"],
        )
        .expect("run completes");

    assert_eq!(
        report.metric("fidelity.tv_distance").and_then(|entry| entry.score),
        Some(0.5)
    );
    assert_eq!(
        report.metric("fidelity.category_coverage").and_then(|entry| entry.score),
        Some(0.5)
    );
}
