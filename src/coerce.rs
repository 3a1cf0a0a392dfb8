//! Lenient numeric coercion for loosely-typed JSON input.
//!
//! Skeleton captures and external model responses arrive as arbitrary JSON. Numbers may be
//! encoded as strings or booleans; anything else is "not a number" and the caller decides
//! what that means (joint absent, default substituted, ...).

use serde_json::Value;

/// Coerces a JSON value to `f64`.
///
/// Accepts numbers, numeric strings (surrounding whitespace ignored) and booleans (`1.0` /
/// `0.0`). The result may be non-finite when a string spells `NaN` or `inf`.
pub fn coerce_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Like [`coerce_f64`] but rejects `NaN` and infinities.
pub fn coerce_finite(value: &Value) -> Option<f64> {
    coerce_f64(value).filter(|v| v.is_finite())
}
