//! Helpers for interpreting request parameter values
//!
//! Filter parameters arrive as untyped JSON. These helpers give every filter
//! the same reading of "empty", lists, ranges and booleans.

use std::cmp::Ordering;

use serde_json::Value;

use crate::data::error::DataError;

/// `null`, `""`, `[]` and `{}` count as "no value supplied"
pub fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

/// Arrays as-is, scalars as a one-element list, empty values as an empty list
pub fn as_list(value: &Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items.clone(),
        v if is_empty(v) => Vec::new(),
        v => vec![v.clone()],
    }
}

/// Read `[min, max]` or `{"min": .., "max": ..}`; null bounds are absent
pub fn as_range(value: &Value) -> (Option<Value>, Option<Value>) {
    let bound = |v: Option<&Value>| v.filter(|v| !v.is_null()).cloned();
    match value {
        Value::Array(items) => (bound(items.first()), bound(items.get(1))),
        Value::Object(map) => (bound(map.get("min")), bound(map.get("max"))),
        _ => (None, None),
    }
}

pub fn as_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_i64() {
            Some(0) => Some(false),
            Some(1) => Some(true),
            _ => None,
        },
        Value::String(s) => match s.to_ascii_lowercase().as_str() {
            "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

pub fn as_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Numeric strings become JSON numbers, everything else is unchanged
///
/// Expressions such as `CAST(strftime(..) AS INTEGER)` carry no column
/// affinity in SQLite, so a text parameter would never compare equal.
pub fn coerce_number(value: Value) -> Value {
    let Value::String(s) = &value else {
        return value;
    };
    let trimmed = s.trim();
    if let Ok(i) = trimmed.parse::<i64>() {
        return Value::from(i);
    }
    match trimmed.parse::<f64>() {
        Ok(f) if f.is_finite() => Value::from(f),
        _ => value,
    }
}

/// SQLite reports booleans inside JSON arrays as 0/1
pub fn normalize_bool(value: Value) -> Value {
    match as_bool(&value) {
        Some(b) if !matches!(value, Value::String(_)) => Value::Bool(b),
        _ => value,
    }
}

fn rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

/// Total order over JSON scalars: nulls, booleans, numbers, then strings
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ => rank(a)
            .cmp(&rank(b))
            .then_with(|| a.to_string().cmp(&b.to_string())),
    }
}

/// Sort and drop duplicates
pub fn sorted_unique(mut values: Vec<Value>, descending: bool) -> Vec<Value> {
    values.sort_by(|a, b| {
        let ord = compare_values(a, b);
        if descending { ord.reverse() } else { ord }
    });
    values.dedup();
    values
}

/// Decode an aggregated JSON array column, dropping null elements
///
/// SQLite returns `json_group_array` as text and PostgreSQL output is cast to
/// text as well; an empty input set aggregates to NULL.
pub fn parse_json_array(value: Value, column: &str) -> Result<Vec<Value>, DataError> {
    let items = match value {
        Value::Null => return Ok(Vec::new()),
        Value::Array(items) => items,
        Value::String(text) => match serde_json::from_str::<Value>(&text) {
            Ok(Value::Array(items)) => items,
            Ok(Value::Null) => Vec::new(),
            Ok(other) => {
                return Err(DataError::decode(
                    column,
                    format!("expected a JSON array, got {}", other),
                ));
            }
            Err(e) => return Err(DataError::decode(column, e.to_string())),
        },
        other => {
            return Err(DataError::decode(
                column,
                format!("expected a JSON array, got {}", other),
            ));
        }
    };
    Ok(items.into_iter().filter(|v| !v.is_null()).collect())
}

/// Key used for a value in a facet count map
pub fn value_key(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_is_empty() {
        assert!(is_empty(&json!(null)));
        assert!(is_empty(&json!("")));
        assert!(is_empty(&json!([])));
        assert!(is_empty(&json!({})));
        assert!(!is_empty(&json!(0)));
        assert!(!is_empty(&json!(false)));
        assert!(!is_empty(&json!("a")));
    }

    #[test]
    fn test_as_list() {
        assert_eq!(as_list(&json!(["a", "b"])), vec![json!("a"), json!("b")]);
        assert_eq!(as_list(&json!("a")), vec![json!("a")]);
        assert!(as_list(&json!(null)).is_empty());
    }

    #[test]
    fn test_as_range_forms() {
        assert_eq!(as_range(&json!([1, 5])), (Some(json!(1)), Some(json!(5))));
        assert_eq!(as_range(&json!([null, 5])), (None, Some(json!(5))));
        assert_eq!(as_range(&json!([3])), (Some(json!(3)), None));
        assert_eq!(
            as_range(&json!({"min": 2, "max": null})),
            (Some(json!(2)), None)
        );
        assert_eq!(as_range(&json!("x")), (None, None));
    }

    #[test]
    fn test_as_bool() {
        assert_eq!(as_bool(&json!(true)), Some(true));
        assert_eq!(as_bool(&json!(0)), Some(false));
        assert_eq!(as_bool(&json!("TRUE")), Some(true));
        assert_eq!(as_bool(&json!("0")), Some(false));
        assert_eq!(as_bool(&json!(2)), None);
        assert_eq!(as_bool(&json!("yes")), None);
    }

    #[test]
    fn test_coerce_number() {
        assert_eq!(coerce_number(json!("2000")), json!(2000));
        assert_eq!(coerce_number(json!(" 2.5 ")), json!(2.5));
        assert_eq!(coerce_number(json!("abc")), json!("abc"));
        assert_eq!(coerce_number(json!(true)), json!(true));
    }

    #[test]
    fn test_normalize_bool_keeps_strings() {
        assert_eq!(normalize_bool(json!(1)), json!(true));
        assert_eq!(normalize_bool(json!(0)), json!(false));
        assert_eq!(normalize_bool(json!("1")), json!("1"));
        assert_eq!(normalize_bool(json!(7)), json!(7));
    }

    #[test]
    fn test_sorted_unique_mixed() {
        let values = vec![json!("b"), json!(2), json!(null), json!("a"), json!(2), json!(true)];
        assert_eq!(
            sorted_unique(values, false),
            vec![json!(null), json!(true), json!(2), json!("a"), json!("b")]
        );
        assert_eq!(
            sorted_unique(vec![json!(1999), json!(2001), json!(2000)], true),
            vec![json!(2001), json!(2000), json!(1999)]
        );
    }

    #[test]
    fn test_parse_json_array() {
        assert_eq!(
            parse_json_array(json!("[1, null, 2]"), "c").unwrap(),
            vec![json!(1), json!(2)]
        );
        assert!(parse_json_array(json!(null), "c").unwrap().is_empty());
        assert!(parse_json_array(json!("null"), "c").unwrap().is_empty());
        assert!(matches!(
            parse_json_array(json!("{\"a\": 1}"), "c"),
            Err(DataError::Decode { .. })
        ));
        assert!(parse_json_array(json!("not json"), "c").is_err());
    }

    #[test]
    fn test_value_key() {
        assert_eq!(value_key(&json!("A")), "A");
        assert_eq!(value_key(&json!(5)), "5");
        assert_eq!(value_key(&json!(true)), "true");
    }
}
