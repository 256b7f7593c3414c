use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Date-only formats recognised by the profiler.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d.%m.%Y"];

/// Date-time formats recognised by the profiler.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
];

/// A single dataset cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Date(NaiveDate),
    Timestamp(NaiveDateTime),
}

impl Value {
    /// Infer a typed value from a raw text token.
    ///
    /// Empty strings and the `null`/`na` markers become [`Value::Null`];
    /// datetimes stay as text and are recognised later by the profiler.
    pub fn parse_cell(raw: &str) -> Value {
        let trimmed = raw.trim();
        if trimmed.is_empty()
            || trimmed.eq_ignore_ascii_case("null")
            || trimmed.eq_ignore_ascii_case("na")
            || trimmed.eq_ignore_ascii_case("nan")
        {
            return Value::Null;
        }
        if let Ok(value) = trimmed.parse::<i64>() {
            return Value::Int(value);
        }
        if let Ok(value) = trimmed.parse::<f64>() {
            if value.is_finite() {
                return Value::Float(value);
            }
        }
        if let Some(value) = parse_bool(trimmed) {
            return Value::Bool(value);
        }
        Value::Text(trimmed.to_string())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Numeric view of the value. Text cells are parsed.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(value) => Some(*value as f64),
            Value::Float(value) if value.is_finite() => Some(*value),
            Value::Text(value) => value
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|value| value.is_finite()),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(value) => Some(*value),
            Value::Text(value) => parse_bool(value.trim()),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            Value::Date(value) => value.and_hms_opt(0, 0, 0),
            Value::Timestamp(value) => Some(*value),
            Value::Text(value) => parse_datetime(value),
            _ => None,
        }
    }

    /// Seconds since the Unix epoch for datetime-like values.
    pub fn as_epoch_seconds(&self) -> Option<f64> {
        self.as_datetime()
            .map(|value| value.and_utc().timestamp() as f64)
    }

    /// Canonical string key used for distinct counts and category frequencies.
    /// Nulls have no key.
    pub fn key(&self) -> Option<String> {
        let key = match self {
            Value::Null => return None,
            Value::Bool(value) => value.to_string(),
            Value::Int(value) => value.to_string(),
            Value::Float(value) => value.to_string(),
            Value::Text(value) => value.clone(),
            Value::Date(value) => value.format("%Y-%m-%d").to_string(),
            Value::Timestamp(value) => value.format("%Y-%m-%dT%H:%M:%S").to_string(),
        };
        Some(key)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

/// Parse a datetime against the fixed set of supported formats.
pub fn parse_datetime(value: &str) -> Option<NaiveDateTime> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return date.and_hms_opt(0, 0, 0);
        }
    }
    for format in DATETIME_FORMATS {
        if let Ok(value) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(value);
        }
    }
    DateTime::parse_from_rfc3339(trimmed)
        .ok()
        .map(|value| value.naive_utc())
}

fn parse_bool(value: &str) -> Option<bool> {
    if value.eq_ignore_ascii_case("true") {
        Some(true)
    } else if value.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_cell_infers_types() {
        assert_eq!(Value::parse_cell(""), Value::Null);
        assert_eq!(Value::parse_cell(" NA "), Value::Null);
        assert_eq!(Value::parse_cell("42"), Value::Int(42));
        assert_eq!(Value::parse_cell("4.5"), Value::Float(4.5));
        assert_eq!(Value::parse_cell("TRUE"), Value::Bool(true));
        assert_eq!(
            Value::parse_cell("2024-01-01"),
            Value::Text("2024-01-01".to_string())
        );
    }

    #[test]
    fn datetime_formats_are_recognised() {
        assert!(parse_datetime("2024-03-01").is_some());
        assert!(parse_datetime("01.03.2024").is_some());
        assert!(parse_datetime("2024-03-01 10:15:00").is_some());
        assert!(parse_datetime("2024-03-01T10:15:00+02:00").is_some());
        assert!(parse_datetime("March 1st").is_none());
    }

    #[test]
    fn text_numbers_have_numeric_view() {
        assert_eq!(Value::from("3.25").as_f64(), Some(3.25));
        assert_eq!(Value::from("inf").as_f64(), None);
        assert_eq!(Value::Int(2).key(), Value::Float(2.0).key());
    }

    #[test]
    fn null_has_no_key() {
        assert_eq!(Value::Null.key(), None);
        assert_eq!(Value::from("null").key(), Some("null".to_string()));
    }
}
