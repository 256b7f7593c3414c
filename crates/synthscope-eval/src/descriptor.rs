use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use synthscope_core::SemanticType;

/// Family a metric belongs to. Declaration order is report order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum MetricCategory {
    Fidelity,
    Utility,
    Privacy,
}

impl MetricCategory {
    pub const ALL: [MetricCategory; 3] = [
        MetricCategory::Fidelity,
        MetricCategory::Utility,
        MetricCategory::Privacy,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricCategory::Fidelity => "fidelity",
            MetricCategory::Utility => "utility",
            MetricCategory::Privacy => "privacy",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|category| category.as_str().eq_ignore_ascii_case(value.trim()))
    }
}

impl std::fmt::Display for MetricCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a larger raw score means a better or a worse result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    HigherIsBetter,
    LowerIsBetter,
}

/// How a raw score maps onto a [0,1] magnitude before orientation is applied.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScoreScale {
    /// Bounded score on `[lo, hi]`; values outside are clamped.
    Linear { lo: f64, hi: f64 },
    /// Unbounded non-negative score, mapped with `tanh`.
    Saturating,
    /// Unbounded non-negative score, mapped with `1 - exp(-rate * s)`.
    Exponential { rate: f64 },
}

impl ScoreScale {
    pub const UNIT: ScoreScale = ScoreScale::Linear { lo: 0.0, hi: 1.0 };

    /// Raw score mapped onto [0,1], preserving direction.
    pub fn magnitude(&self, raw: f64) -> f64 {
        match *self {
            ScoreScale::Linear { lo, hi } => (raw.clamp(lo, hi) - lo) / (hi - lo),
            ScoreScale::Saturating => raw.max(0.0).tanh(),
            ScoreScale::Exponential { rate } => 1.0 - (-rate * raw.max(0.0)).exp(),
        }
    }

    fn validate(&self) -> Result<(), String> {
        match *self {
            ScoreScale::Linear { lo, hi } => {
                if !lo.is_finite() || !hi.is_finite() || hi <= lo {
                    return Err(format!("linear scale needs finite lo < hi, got [{lo}, {hi}]"));
                }
            }
            ScoreScale::Saturating => {}
            ScoreScale::Exponential { rate } => {
                if !rate.is_finite() || rate <= 0.0 {
                    return Err(format!("exponential scale needs a positive rate, got {rate}"));
                }
            }
        }
        Ok(())
    }
}

/// Which of the two datasets a metric reads. The schema always comes from
/// the real dataset, so a single-dataset metric reads the real one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum DatasetRequirement {
    Both,
    RealOnly,
}

impl DatasetRequirement {
    pub fn as_str(&self) -> &'static str {
        match self {
            DatasetRequirement::Both => "both",
            DatasetRequirement::RealOnly => "real_only",
        }
    }
}

/// Immutable declaration of what a metric is and how its score is read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct MetricDescriptor {
    /// Unique identifier, conventionally `<category>.<name>`.
    pub id: String,
    pub category: MetricCategory,
    /// Semantic types the metric can operate on.
    pub required_types: Vec<SemanticType>,
    pub datasets: DatasetRequirement,
    /// Needs `target_column` to be configured.
    pub needs_target: bool,
    pub default_weight: f64,
    pub scale: ScoreScale,
    pub orientation: Orientation,
    pub description: String,
}

impl MetricDescriptor {
    pub fn new(id: impl Into<String>, category: MetricCategory) -> Self {
        Self {
            id: id.into(),
            category,
            required_types: Vec::new(),
            datasets: DatasetRequirement::Both,
            needs_target: false,
            default_weight: 1.0,
            scale: ScoreScale::UNIT,
            orientation: Orientation::HigherIsBetter,
            description: String::new(),
        }
    }

    pub fn requires(mut self, types: &[SemanticType]) -> Self {
        self.required_types = types.to_vec();
        self
    }

    pub fn datasets(mut self, datasets: DatasetRequirement) -> Self {
        self.datasets = datasets;
        self
    }

    pub fn needs_target(mut self) -> Self {
        self.needs_target = true;
        self
    }

    pub fn weight(mut self, weight: f64) -> Self {
        self.default_weight = weight;
        self
    }

    pub fn scale(mut self, scale: ScoreScale) -> Self {
        self.scale = scale;
        self
    }

    pub fn lower_is_better(mut self) -> Self {
        self.orientation = Orientation::LowerIsBetter;
        self
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Check the descriptor is usable for aggregation.
    pub fn validate(&self) -> Result<(), String> {
        if self.id.trim().is_empty() {
            return Err("identifier must not be empty".to_string());
        }
        if MetricCategory::parse(&self.id).is_some() {
            return Err("identifier must not shadow a category name".to_string());
        }
        if !self.default_weight.is_finite() || self.default_weight < 0.0 {
            return Err(format!(
                "default weight must be finite and >= 0, got {}",
                self.default_weight
            ));
        }
        self.scale.validate()
    }

    /// Map a raw score onto the common [0,1] higher-is-better scale.
    pub fn normalize(&self, raw: f64) -> f64 {
        let magnitude = self.scale.magnitude(raw);
        match self.orientation {
            Orientation::HigherIsBetter => magnitude,
            Orientation::LowerIsBetter => 1.0 - magnitude,
        }
    }
}
