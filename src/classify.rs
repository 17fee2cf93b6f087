//! Inbound message classification.
//!
//! Every payload is parsed exactly once and sorted into one of three shapes;
//! the dispatcher matches on the result.

use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq)]
pub enum Classification {
    /// A JSON object, with its `type` label and text content pulled out
    Structured {
        kind: String,
        content: String,
        raw: Map<String, Value>,
    },
    /// Valid JSON that is not an object
    OpaqueJson(Value),
    /// Anything that does not parse as JSON
    PlainText(String),
}

pub fn classify(raw: &str) -> Classification {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => {
            let kind = map
                .get("type")
                .map(field_text)
                .unwrap_or_else(|| "unknown".to_string());
            let content = map
                .get("content")
                .or_else(|| map.get("message"))
                .map(field_text)
                .unwrap_or_default();
            Classification::Structured {
                kind,
                content,
                raw: map,
            }
        }
        Ok(value) => Classification::OpaqueJson(value),
        Err(_) => Classification::PlainText(raw.to_string()),
    }
}

/// JSON type name of a value, as reported back in `data_type`
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// Strings are taken as-is, anything else as its JSON text
fn field_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
