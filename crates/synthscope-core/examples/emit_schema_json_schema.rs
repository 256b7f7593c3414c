use schemars::schema_for;
use synthscope_core::Schema;

fn main() {
    let schema = schema_for!(Schema);
    let json = serde_json::to_string_pretty(&schema).expect("serialize json schema");
    println!("{json}");
}
