use std::path::Path;

use synthscope_eval::EvaluateOptions;

use crate::error::CliResult;

/// Load evaluation options from a TOML file, or defaults when absent.
pub fn load_options(path: Option<&Path>) -> CliResult<EvaluateOptions> {
    match path {
        Some(path) => parse_options(&std::fs::read_to_string(path)?),
        None => Ok(EvaluateOptions::default()),
    }
}

pub fn parse_options(text: &str) -> CliResult<EvaluateOptions> {
    Ok(toml::from_str(text)?)
}

#[cfg(test)]
mod tests {
    use synthscope_eval::NeighbourDistance;

    use super::*;

    #[test]
    fn partial_config_keeps_defaults() {
        let options = parse_options(
            r#"
seed = 7
target_column = "city"
distance = "euclid"
corr_numeric_only = true

[weights]
"fidelity.corr_diff" = 2.0

[category_weights]
privacy = 0.5

[profile]
numeric_distinct_threshold = 4

[metric_timeouts_ms]
"privacy.dcr" = 1000
"#,
        )
        .expect("options");

        assert_eq!(options.seed, 7);
        assert_eq!(options.target_column.as_deref(), Some("city"));
        assert_eq!(options.weights.get("fidelity.corr_diff"), Some(&2.0));
        assert_eq!(options.category_weights.get("privacy"), Some(&0.5));
        assert_eq!(options.profile.numeric_distinct_threshold, 4);
        assert_eq!(options.profile.categorical_cardinality_threshold, 50);
        assert_eq!(options.holdout_fraction, 0.3);
        assert_eq!(options.distance, NeighbourDistance::Euclid);
        assert!(options.corr_numeric_only);
        assert_eq!(
            options.timeout_for("privacy.dcr"),
            Some(std::time::Duration::from_millis(1000))
        );
    }

    #[test]
    fn defaults_use_mixed_distance() {
        let options = parse_options("").expect("options");
        assert_eq!(options.distance, NeighbourDistance::Gower);
        assert!(!options.corr_numeric_only);
    }

    #[test]
    fn unknown_types_are_rejected() {
        assert!(parse_options("seed = \"many\"").is_err());
        assert!(parse_options("distance = \"manhattan\"").is_err());
    }
}
