use std::fs::File;
use std::io::Read;
use std::path::Path;

use synthscope_core::{Dataset, Value};

use crate::error::CliResult;

/// Load a CSV file with a header row into a dataset.
pub fn load_csv(path: &Path) -> CliResult<Dataset> {
    read_csv(File::open(path)?)
}

/// Read CSV records into a dataset, inferring a typed value per cell.
pub fn read_csv<R: Read>(input: R) -> CliResult<Dataset> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(input);

    let headers = reader
        .headers()?
        .iter()
        .map(|header| header.trim().to_string())
        .collect::<Vec<_>>();

    let mut rows: Vec<Vec<Value>> = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(Value::parse_cell).collect());
    }

    Ok(Dataset::from_rows(&headers, rows)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CliError;

    #[test]
    fn infers_cell_types() {
        let data = "age,city,active,score\n31, lisbon ,true,1.5\nNA,porto,false,\n";
        let dataset = read_csv(data.as_bytes()).expect("dataset");

        assert_eq!(dataset.column_names(), vec!["age", "city", "active", "score"]);
        assert_eq!(dataset.n_rows(), 2);
        let age = dataset.column("age").expect("age");
        assert_eq!(age.values, vec![Value::Int(31), Value::Null]);
        let city = dataset.column("city").expect("city");
        assert_eq!(city.values[0], Value::Text("lisbon".to_string()));
        let active = dataset.column("active").expect("active");
        assert_eq!(active.values[1], Value::Bool(false));
        let score = dataset.column("score").expect("score");
        assert_eq!(score.values, vec![Value::Float(1.5), Value::Null]);
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let data = "a,b\n1,2\n3\n";
        assert!(matches!(read_csv(data.as_bytes()), Err(CliError::Csv(_))));
    }

    #[test]
    fn duplicate_headers_are_rejected() {
        let data = "a,a\n1,2\n";
        assert!(matches!(read_csv(data.as_bytes()), Err(CliError::Core(_))));
    }
}
