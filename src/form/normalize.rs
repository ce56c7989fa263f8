//! Payload normalization.
//!
//! HubSpot delivers submitted values in several shapes depending on the embed
//! type and event. The payload is classified once into a [`RawPayload`] and
//! then flattened into a [`FormData`] map.

use serde_json::{Map, Value};

use super::FormData;

/// Shape of a raw form payload.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawPayload<'a> {
    /// Nothing usable (null, empty, or a scalar)
    Empty,
    /// Sequence of `{name|field, value}` records
    Records(&'a [Value]),
    /// `{fields: {key: value, ...}}`
    KeyedFields(&'a Map<String, Value>),
    /// Plain `{key: value, ...}` object
    FlatObject(&'a Map<String, Value>),
}

impl<'a> RawPayload<'a> {
    /// Classifies a JSON payload.
    pub fn classify(raw: &'a Value) -> Self {
        match raw {
            Value::Array(records) => RawPayload::Records(records),
            Value::Object(map) => match map.get("fields") {
                Some(Value::Array(records)) => RawPayload::Records(records),
                Some(Value::Object(fields)) => RawPayload::KeyedFields(fields),
                Some(fields) if is_truthy(fields) => RawPayload::Empty,
                _ => RawPayload::FlatObject(map),
            },
            _ => RawPayload::Empty,
        }
    }
}

/// Flattens any supported payload shape into a [`FormData`] map.
///
/// Every entry is stored under its original key and its canonical key. Values
/// are coerced to strings: arrays contribute their first element, `null`
/// becomes the empty string, and other scalars are stringified. Unsupported
/// input yields an empty map.
///
/// ```
/// use scheduler_router::form::normalize_form_data;
/// use serde_json::json;
///
/// let form = normalize_form_data(&json!({"fields": [{"name": "0-1/email", "value": "x@y.com"}]}));
/// assert_eq!(form.get("0-1/email"), Some("x@y.com"));
/// assert_eq!(form.get("email"), Some("x@y.com"));
/// ```
pub fn normalize_form_data(raw: &Value) -> FormData {
    let mut out = FormData::new();

    match RawPayload::classify(raw) {
        RawPayload::Empty => {}
        RawPayload::Records(records) => {
            for record in records {
                let Some(record) = record.as_object() else {
                    continue;
                };
                let Some(name) = record_name(record) else {
                    continue;
                };
                let value = coerce_value(record.get("value").unwrap_or(&Value::Null));
                out.insert_field(name, value);
            }
        }
        RawPayload::KeyedFields(fields) | RawPayload::FlatObject(fields) => {
            for (key, value) in fields {
                out.insert_field(key, coerce_value(value));
            }
        }
    }

    out
}

/// `name` if present and non-empty, else `field`.
fn record_name(record: &Map<String, Value>) -> Option<&str> {
    ["name", "field"]
        .iter()
        .filter_map(|k| record.get(*k).and_then(Value::as_str))
        .find(|n| !n.is_empty())
}

fn coerce_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Array(items) => items.first().map(coerce_value).unwrap_or_default(),
        other => other.to_string(),
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        _ => true,
    }
}
