use synthscope_core::{
    Column, Dataset, Error, ProfileOptions, SemanticType, Value, profile,
};

fn sample_dataset() -> Dataset {
    let ages = (0..30).map(|idx| Value::Int(20 + idx)).collect::<Vec<_>>();
    let cities = (0..30)
        .map(|idx| Value::from(["Lisbon", "Porto", "Braga"][idx % 3]))
        .collect::<Vec<_>>();
    let joined = (0..30)
        .map(|idx| Value::Text(format!("2024-01-{:02}", idx % 28 + 1)))
        .collect::<Vec<_>>();
    let active = (0..30)
        .map(|idx| if idx == 4 { Value::Null } else { Value::Bool(idx % 2 == 0) })
        .collect::<Vec<_>>();
    let notes = (0..30)
        .map(|idx| Value::Text(format!("free text note {idx}")))
        .collect::<Vec<_>>();
    let rating = (0..30)
        .map(|idx| Value::Int((idx % 5) as i64))
        .collect::<Vec<_>>();

    Dataset::new(vec![
        Column::new("age", ages),
        Column::new("city", cities),
        Column::new("joined", joined),
        Column::new("active", active),
        Column::new("notes", notes),
        Column::new("rating", rating),
    ])
    .expect("valid dataset")
}

fn narrow_options() -> ProfileOptions {
    ProfileOptions {
        numeric_distinct_threshold: 10,
        categorical_cardinality_threshold: 20,
    }
}

#[test]
fn classifies_each_semantic_type() {
    let schema = profile(&sample_dataset(), &narrow_options()).expect("profile");

    let kind = |name: &str| {
        schema
            .column(name)
            .map(|column| column.semantic_type)
            .expect("column present")
    };
    assert_eq!(kind("age"), SemanticType::Numerical);
    assert_eq!(kind("city"), SemanticType::Categorical);
    assert_eq!(kind("joined"), SemanticType::Datetime);
    assert_eq!(kind("active"), SemanticType::Boolean);
    assert_eq!(kind("notes"), SemanticType::Text);
    // few distinct numbers fall through to categorical
    assert_eq!(kind("rating"), SemanticType::Categorical);
}

#[test]
fn records_nullability_and_cardinality() {
    let schema = profile(&sample_dataset(), &narrow_options()).expect("profile");
    let active = schema.column("active").expect("active column");
    assert!(active.nullable);
    assert_eq!(active.null_count, 1);
    assert_eq!(active.distinct_count, 2);

    let city = schema.column("city").expect("city column");
    assert!(!city.nullable);
    assert_eq!(city.distinct_count, 3);
}

#[test]
fn profiling_is_idempotent() {
    let dataset = sample_dataset();
    let first = profile(&dataset, &ProfileOptions::default()).expect("first profile");
    let second = profile(&dataset, &ProfileOptions::default()).expect("second profile");
    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).expect("serialize"),
        serde_json::to_string(&second).expect("serialize")
    );
}

#[test]
fn all_null_column_is_categorical() {
    let dataset = Dataset::new(vec![Column::new("empty", vec![Value::Null; 5])])
        .expect("valid dataset");
    let schema = profile(&dataset, &ProfileOptions::default()).expect("profile");
    assert_eq!(schema.columns[0].semantic_type, SemanticType::Categorical);
    assert!(schema.columns[0].nullable);
}

#[test]
fn empty_inputs_are_rejected() {
    let no_columns = Dataset::new(Vec::new()).expect("empty dataset is constructible");
    assert!(matches!(
        profile(&no_columns, &ProfileOptions::default()),
        Err(Error::EmptyDataset(_))
    ));

    let no_rows = Dataset::new(vec![Column::new("a", Vec::new())]).expect("valid dataset");
    assert!(matches!(
        profile(&no_rows, &ProfileOptions::default()),
        Err(Error::EmptyDataset(_))
    ));
}
