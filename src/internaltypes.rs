//! Conversions between state values and configuration API values.
//!
//! State is JSON shaped by the schema: unset attributes are `null` and sets
//! are sorted arrays. API bodies use the server's shapes, where a
//! multi-valued property may come back as a lone string and an unset one is
//! simply absent.

use std::collections::BTreeSet;

use serde_json::Value;

/// Read a string, treating `null` (and optionally `""`) as unset.
pub fn string_value(value: &Value, empty_is_unset: bool) -> Option<String> {
    match value {
        Value::String(s) if empty_is_unset && s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        _ => None,
    }
}

/// Read a boolean; also accepts the strings `"true"` and `"false"`.
pub fn bool_value(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

/// Read an integer, accepting integral floats and numeric strings.
pub fn int64_value(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f <= i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

/// Read a floating point number, accepting numeric strings.
pub fn float64_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

/// Read a set of strings. A lone string is a one-element set; `null` is
/// empty.
pub fn string_set(value: &Value) -> BTreeSet<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(|v| v.as_str().map(String::from))
            .collect(),
        Value::String(s) => BTreeSet::from([s.clone()]),
        _ => BTreeSet::new(),
    }
}

/// State value for an optional string.
pub fn string_value_or_null(value: Option<&str>, empty_is_null: bool) -> Value {
    match value {
        Some(s) if empty_is_null && s.is_empty() => Value::Null,
        Some(s) => Value::String(s.to_string()),
        None => Value::Null,
    }
}

/// State value for a set of strings: a sorted array.
pub fn string_set_value<I, S>(values: I) -> Value
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let set: BTreeSet<String> = values.into_iter().map(Into::into).collect();
    Value::Array(set.into_iter().map(Value::String).collect())
}

/// Normalize a set received from the server (or from a plan) into state
/// form.
pub fn normalize_string_set(value: &Value) -> Value {
    string_set_value(string_set(value))
}

/// Whether two values are equal once sets are compared as sets.
pub fn same_set(a: &Value, b: &Value) -> bool {
    string_set(a) == string_set(b)
}
