use crate::descriptor::MetricCategory;
use crate::metrics::{MetricEntry, Report};
use crate::model::MetricStatus;

/// Category scores below this are called out in recommendations.
const LOW_SCORE: f64 = 0.5;

/// Render a deterministic markdown summary of a report.
pub fn render_report(report: &Report) -> String {
    let mut lines = Vec::new();

    lines.push("# Synthscope Evaluation Report".to_string());
    lines.push(String::new());
    lines.push("## Run summary".to_string());
    lines.push(format!("- run_id: {}", report.meta.run_id));
    lines.push(format!("- report_version: {}", report.meta.report_version));
    lines.push(format!("- timestamp: {}", report.meta.timestamp));
    lines.push(format!("- seed: {}", report.meta.seed));
    lines.push(format!(
        "- rows: {} real / {} synthetic",
        report.meta.n_real_rows, report.meta.n_synthetic_rows
    ));
    lines.push(format!("- columns: {}", report.meta.n_columns));
    lines.push(format!("- duration_ms: {}", report.meta.duration_ms));
    lines.push(format!("- overall: {}", score_cell(report.overall)));
    lines.push(String::new());

    lines.push("## Category scores".to_string());
    lines.push("| category | score | ok | skipped | failed |".to_string());
    lines.push("| --- | --- | --- | --- | --- |".to_string());
    for (category, score) in &report.categories {
        let count = |status| {
            report
                .metrics
                .iter()
                .filter(|entry| entry.category == *category && entry.status == status)
                .count()
        };
        lines.push(format!(
            "| {} | {} | {} | {} | {} |",
            category,
            score_cell(*score),
            count(MetricStatus::Ok),
            count(MetricStatus::Skipped),
            count(MetricStatus::Failed)
        ));
    }
    lines.push(String::new());

    lines.push("## Metrics".to_string());
    lines.push("| metric | category | status | score | normalized | weight | notes |".to_string());
    lines.push("| --- | --- | --- | --- | --- | --- | --- |".to_string());
    for entry in &report.metrics {
        lines.push(format!(
            "| {} | {} | {} | {} | {} | {} | {} |",
            entry.name,
            entry.category,
            entry.status.as_str(),
            score_cell(entry.score),
            score_cell(entry.normalized),
            entry.weight,
            notes(entry)
        ));
    }
    lines.push(String::new());

    lines.push("## Schema".to_string());
    lines.push("| column | type | nullable | nulls | distinct |".to_string());
    lines.push("| --- | --- | --- | --- | --- |".to_string());
    for column in &report.schema.columns {
        lines.push(format!(
            "| {} | {} | {} | {} | {} |",
            column.name,
            column.semantic_type,
            column.nullable,
            column.null_count,
            column.distinct_count
        ));
    }
    lines.push(String::new());

    lines.push("## Recommendations".to_string());
    lines.extend(recommendations(report));
    lines.join("\n")
}

fn score_cell(score: Option<f64>) -> String {
    score
        .map(|value| format!("{value:.4}"))
        .unwrap_or_else(|| "-".to_string())
}

fn notes(entry: &MetricEntry) -> String {
    if let Some(error) = &entry.error {
        return escape(error);
    }
    entry
        .details
        .iter()
        .map(|(key, value)| format!("{key}={value:.4}"))
        .collect::<Vec<_>>()
        .join(", ")
}

fn escape(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

fn recommendations(report: &Report) -> Vec<String> {
    let mut lines = Vec::new();
    for entry in &report.metrics {
        match entry.status {
            MetricStatus::Failed => lines.push(format!(
                "- {} failed; check its configuration or input data.",
                entry.name
            )),
            MetricStatus::Skipped => lines.push(format!(
                "- {} was skipped; the dataset lacks the columns it needs.",
                entry.name
            )),
            MetricStatus::Ok => {}
        }
    }
    for (category, score) in &report.categories {
        match score {
            Some(score) if *score < LOW_SCORE => lines.push(format!(
                "- {category} score is low ({score:.4}); {}",
                category_hint(*category)
            )),
            None => lines.push(format!(
                "- {category} has no successful metric; its score is undefined."
            )),
            _ => {}
        }
    }
    if lines.is_empty() {
        lines.push("- all metrics succeeded; compare scores across runs for drift.".to_string());
    }
    lines
}

fn category_hint(category: MetricCategory) -> &'static str {
    match category {
        MetricCategory::Fidelity => "synthetic distributions drift from the real data.",
        MetricCategory::Utility => "models trained on synthetic data underperform.",
        MetricCategory::Privacy => "synthetic records sit close to real records.",
    }
}
