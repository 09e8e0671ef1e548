//! Normalization of raw remote scalars into profile attribute strings.
//!
//! This is the only place where "missing" remote data becomes the empty
//! string; everything downstream works on fully defaulted values.

use serde_json::Value;

/// Trimmed string for JSON strings, `""` for anything else (absent, null,
/// numbers, booleans, arrays, objects).
pub fn sanitize(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.trim().to_string(),
        _ => String::new(),
    }
}

pub fn sanitize_str(value: Option<&str>) -> String {
    value.map(|s| s.trim().to_string()).unwrap_or_default()
}
