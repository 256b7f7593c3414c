use synthscope_core::{Column, Dataset, Value};
use synthscope_eval::{EvaluateOptions, EvaluationEngine, render_report};

fn dataset(shift: i64, cities: &[&str]) -> Result<Dataset, synthscope_core::Error> {
    let ages = (18..60).map(|age| age + shift).collect::<Vec<i64>>();
    Dataset::new(vec![
        Column::new("age", ages.iter().map(|age| Value::Int(*age)).collect()),
        Column::new(
            "city",
            ages.iter()
                .map(|age| Value::from(cities[*age as usize % cities.len()]))
                .collect(),
        ),
        Column::new(
            "member",
            ages.iter().map(|age| Value::Bool(age % 3 == 0)).collect(),
        ),
    ])
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let selection = std::env::args().skip(1).collect::<Vec<_>>();

    let real = dataset(0, &["lisbon", "porto", "braga"])?;
    let synthetic = dataset(4, &["lisbon", "porto", "faro"])?;

    let options = EvaluateOptions {
        target_column: Some("city".to_string()),
        ..EvaluateOptions::default()
    };
    let engine = EvaluationEngine::with_builtins(options);
    let report = engine.run(real, synthetic, selection.as_slice())?;

    println!("{}", render_report(&report));
    Ok(())
}
