//! Query-driven narrowing of preset payloads.
//!
//! The filter is a pure function over arbitrary JSON. Only the filter keys a
//! preset declares AND the request actually supplies take part; with none in
//! common the value passes through untouched. Arrays are narrowed element by
//! element, objects are walked so the narrowing reaches nested arrays, and
//! everything else passes through.

use serde_json::Value;
use std::collections::HashMap;

/// Narrow `data` against the preset's filter keys and the request query.
///
/// Semantics per element of an array: AND across distinct active keys, OR
/// across the comma-separated values supplied for one key. Elements without
/// nameable fields (scalars, null, nested arrays) are kept unconditionally.
pub fn filter_response_data(
    data: Value,
    filter_keys: &[String],
    query: &HashMap<String, String>,
) -> Value {
    let active: Vec<&str> = filter_keys
        .iter()
        .map(String::as_str)
        .filter(|key| query.contains_key(*key))
        .collect();
    if active.is_empty() {
        return data;
    }
    apply(data, &active, query)
}

fn apply(value: Value, active: &[&str], query: &HashMap<String, String>) -> Value {
    match value {
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .filter(|item| match item.as_object() {
                    Some(fields) => element_matches(fields, active, query),
                    None => true,
                })
                .collect(),
        ),
        Value::Object(fields) => Value::Object(
            fields
                .into_iter()
                .map(|(key, value)| {
                    let value = if value.is_array() {
                        apply(value, active, query)
                    } else {
                        value
                    };
                    (key, value)
                })
                .collect(),
        ),
        other => other,
    }
}

fn element_matches(
    fields: &serde_json::Map<String, Value>,
    active: &[&str],
    query: &HashMap<String, String>,
) -> bool {
    active.iter().all(|key| {
        match (query.get(*key), fields.get(*key)) {
            (Some(wanted), Some(value)) => {
                let value = stringify(value);
                wanted
                    .split(',')
                    .map(str::trim)
                    .any(|candidate| candidate == value)
            }
            // A field absent on the element never matches. Exclusion for
            // missing fields is contract, not accident.
            _ => false,
        }
    })
}

/// Stringify a field value the way it is compared against query text:
/// scalars render bare, containers render as compact JSON.
fn stringify(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
