//! Output shapes produced by specs and facets

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::data::error::DataError;

/// A selectable option: stored value plus the label shown to users
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    pub value: Value,
    pub label: Value,
}

impl Choice {
    pub fn new(value: impl Into<Value>, label: impl Into<Value>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }

    pub fn to_value(&self) -> Value {
        serde_json::json!({ "value": self.value, "label": self.label })
    }
}

/// Fixed set of choices for an enumerated column
pub trait Choices {
    fn choices() -> Vec<Choice>;
}

/// How the min/max of a range aggregate is reported
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RangeSchema {
    /// Floats
    #[default]
    Number,
    /// RFC 3339 UTC timestamps
    Datetime,
}

impl RangeSchema {
    /// Build `{"min": .., "max": ..}` from raw aggregate values
    pub fn parse(&self, column: &str, min: Value, max: Value) -> Result<Value, DataError> {
        Ok(serde_json::json!({
            "min": self.parse_bound(column, min)?,
            "max": self.parse_bound(column, max)?,
        }))
    }

    fn parse_bound(&self, column: &str, value: Value) -> Result<Value, DataError> {
        if value.is_null() {
            return Ok(Value::Null);
        }
        match self {
            Self::Number => parse_number(column, &value),
            Self::Datetime => parse_datetime(column, &value),
        }
    }
}

fn parse_number(column: &str, value: &Value) -> Result<Value, DataError> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    number
        .and_then(serde_json::Number::from_f64)
        .map(Value::Number)
        .ok_or_else(|| DataError::decode(column, format!("{} is not a number", value)))
}

fn parse_datetime(column: &str, value: &Value) -> Result<Value, DataError> {
    let Value::String(text) = value else {
        return Err(DataError::decode(
            column,
            format!("{} is not a timestamp", value),
        ));
    };

    let parsed = DateTime::parse_from_rfc3339(text)
        .map(|ts| ts.with_timezone(&Utc))
        .or_else(|_| {
            NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f").map(|ts| ts.and_utc())
        })
        .or_else(|_| {
            NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f").map(|ts| ts.and_utc())
        })
        .or_else(|_| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .map(|d| d.and_time(NaiveTime::MIN).and_utc())
        })
        .map_err(|e| DataError::decode(column, format!("{:?} is not a timestamp: {}", text, e)))?;

    Ok(Value::String(
        parsed.to_rfc3339_opts(SecondsFormat::Secs, true),
    ))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_number_range() {
        let specs = RangeSchema::Number
            .parse("price", json!(10), json!("25.5"))
            .unwrap();
        assert_eq!(specs, json!({"min": 10.0, "max": 25.5}));
    }

    #[test]
    fn test_empty_range_is_null() {
        let specs = RangeSchema::Number
            .parse("price", json!(null), json!(null))
            .unwrap();
        assert_eq!(specs, json!({"min": null, "max": null}));
    }

    #[test]
    fn test_number_range_rejects_text() {
        let err = RangeSchema::Number
            .parse("price", json!("cheap"), json!(null))
            .unwrap_err();
        assert!(matches!(err, DataError::Decode { .. }));
    }

    #[test]
    fn test_datetime_range_normalizes() {
        let specs = RangeSchema::Datetime
            .parse(
                "created_at",
                json!("2024-01-05T10:00:00Z"),
                json!("2024-02-01 08:30:00"),
            )
            .unwrap();
        assert_eq!(
            specs,
            json!({"min": "2024-01-05T10:00:00Z", "max": "2024-02-01T08:30:00Z"})
        );

        let specs = RangeSchema::Datetime
            .parse("birth_date", json!("1990-03-04"), json!("2024-01-01T12:00:00+02:00"))
            .unwrap();
        assert_eq!(
            specs,
            json!({"min": "1990-03-04T00:00:00Z", "max": "2024-01-01T10:00:00Z"})
        );
    }

    #[test]
    fn test_choice_to_value() {
        assert_eq!(
            Choice::new("ru", "Russia").to_value(),
            json!({"value": "ru", "label": "Russia"})
        );
    }
}
