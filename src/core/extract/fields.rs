use serde_json::Value;
use unicode_normalization::UnicodeNormalization;

use super::ExtractionError;

/// Array under `key`, if present.
pub fn list<'a>(value: &'a Value, key: &str) -> Option<&'a [Value]> {
    value.get(key)?.as_array().map(Vec::as_slice)
}

/// Scalar under `key` rendered as NFC text. Numbers are accepted since the
/// feed is loose about ids and runtimes.
pub fn text(value: &Value, key: &str) -> Option<String> {
    match value.get(key)? {
        Value::String(s) => Some(normalize(s)),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub fn normalize(s: &str) -> String {
    s.nfc().collect()
}

pub fn required_text(
    value: &Value,
    record: &'static str,
    field: &'static str,
    location: &str,
) -> Result<String, ExtractionError> {
    text(value, field).ok_or_else(|| ExtractionError::field_missing(record, field, location))
}

pub fn required_list<'a>(
    value: &'a Value,
    record: &'static str,
    field: &'static str,
    location: &str,
) -> Result<&'a [Value], ExtractionError> {
    list(value, field).ok_or_else(|| ExtractionError::field_missing(record, field, location))
}
