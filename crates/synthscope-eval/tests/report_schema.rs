use schemars::schema_for;
use synthscope_eval::Report;

#[test]
fn report_json_schema_lists_top_level_fields() {
    let generated = schema_for!(Report);
    let json = serde_json::to_value(&generated).expect("serialize generated schema");

    let properties = json["properties"].as_object().expect("object schema");
    for field in ["metrics", "categories", "overall", "meta", "schema"] {
        assert!(properties.contains_key(field), "missing {field}");
    }
    let required = json["required"].as_array().expect("required list");
    assert!(required.iter().any(|value| value == "metrics"));
}

#[test]
fn metric_entries_are_keyed_by_name() {
    let generated = schema_for!(Report);
    let json = serde_json::to_value(&generated).expect("serialize generated schema");

    let entry = &json["definitions"]["MetricEntry"]["properties"];
    assert!(entry.get("name").is_some());
    assert!(entry.get("metric").is_none());
}
