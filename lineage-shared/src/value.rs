//! Typed field values.

use serde::Serialize;
use serde_json::{Map, Value};
use uuid::Uuid;

/// A field value after template-driven coercion.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TypedValue {
    /// Free text.
    Text(String),
    /// A float constrained to `[0, 1]`.
    Score(f64),
    /// A JSON object.
    Json(Map<String, Value>),
    /// An entity GUID.
    Guid(Uuid),
}

impl TypedValue {
    /// Stable textual form used for identity hashing.
    ///
    /// Scores use Rust's shortest round-trip float formatting (with `-0`
    /// written as `0`), GUIDs the
    /// lowercase hyphenated form, and JSON objects a compact serialisation
    /// with keys sorted at every depth.
    pub fn canonical(&self) -> String {
        match self {
            TypedValue::Text(s) => s.clone(),
            TypedValue::Score(v) => format!("{}", v + 0.0),
            TypedValue::Json(map) => canonical_json(&Value::Object(map.clone())),
            TypedValue::Guid(id) => id.hyphenated().to_string(),
        }
    }

    /// Convert into a plain JSON value for wire payloads.
    pub fn to_json(&self) -> Value {
        match self {
            TypedValue::Text(s) => Value::String(s.clone()),
            TypedValue::Score(v) => serde_json::Number::from_f64(*v)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            TypedValue::Json(map) => Value::Object(map.clone()),
            TypedValue::Guid(id) => Value::String(id.hyphenated().to_string()),
        }
    }

    /// Borrow the text payload, if this is a text value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            TypedValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// The score payload, if this is a score value.
    pub fn as_score(&self) -> Option<f64> {
        match self {
            TypedValue::Score(v) => Some(*v),
            _ => None,
        }
    }
}

/// Serialise a JSON value compactly with object keys sorted recursively.
///
/// Independent of whether `serde_json` was built with `preserve_order`.
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                write_canonical(&map[key], out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        other => out.push_str(&other.to_string()),
    }
}
