//! Lenient decimal parsing for provider fields that may be JSON numbers or
//! numeric strings.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Reads a JSON number or numeric string as `f64`.
///
/// Returns `None` for any other JSON type or for text that does not parse.
/// `"NaN"` and `"inf"` parse successfully; range checks are the caller's
/// job.
#[must_use]
pub fn from_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// `serde` adapter for `#[serde(deserialize_with = "decimal::deserialize")]`.
///
/// # Errors
///
/// Fails if the value is neither a number nor a numeric string.
pub fn deserialize<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    from_value(&value)
        .ok_or_else(|| serde::de::Error::custom(format!("expected a decimal, got {value}")))
}
