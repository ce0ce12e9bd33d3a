//! Helpers for the loosely typed fields of hub frames.
//!
//! The hub is not strict about field types (`timestamp` may be a number,
//! `to` may be an array), so routed-message fields are kept as
//! `serde_json::Value` and flattened to strings here.

use serde_json::Value;

/// Payload fields checked, in order, for a human-readable body.
const CONTENT_KEYS: [&str; 5] = ["content", "message", "text", "result", "task"];

/// Flatten a JSON value to a string.
///
/// Strings pass through, integral numbers print without decimals, other
/// numbers round to zero decimals, `null` is empty, and arrays/objects are
/// rendered as compact JSON.
pub fn as_string(v: &Value) -> String {
    match v {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i.to_string()
            } else if let Some(u) = n.as_u64() {
                u.to_string()
            } else {
                format!("{:.0}", n.as_f64().unwrap_or_default())
            }
        }
        Value::Array(_) | Value::Object(_) => v.to_string(),
    }
}

/// Same as [`as_string`] for an optional field.
pub fn opt_string(v: Option<&Value>) -> String {
    v.map(as_string).unwrap_or_default()
}

/// Extract display content from a routed payload.
///
/// A string payload is used as-is. For an object, the first non-blank string
/// among `content`, `message`, `text`, `result`, `task` wins; otherwise the
/// whole object is rendered back to JSON. Anything else renders as JSON.
pub fn payload_to_content(payload: Option<&Value>) -> String {
    match payload {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Object(map)) => CONTENT_KEYS
            .iter()
            .filter_map(|k| map.get(*k).and_then(Value::as_str))
            .find(|s| !s.trim().is_empty())
            .map(str::to_owned)
            .unwrap_or_else(|| Value::Object(map.clone()).to_string()),
        Some(other) => other.to_string(),
    }
}
