//! Trust boundary for Meaning-shaped data.
//!
//! [`validate_meaning`] turns an arbitrary JSON candidate (self-produced or returned by an
//! external model) into a bounded [`MeaningRecord`], or rejects it. It is a pure transform:
//! the candidate is never modified.

use serde_json::{Map, Value};

use crate::calibration::NormalizerDefaults;
use crate::coerce::{coerce_f64, coerce_finite};
use crate::error::InvalidMeaning;
use crate::meaning::{
    languages, Direction, Intent, MeaningParams, MeaningRecord, SCHEMA_VERSION,
};

/// Clamps into `[0, 1]`, substituting `default` for a missing or NaN value.
pub fn clamp_unit(value: Option<f64>, default: f64) -> f64 {
    let v = match value {
        Some(v) if !v.is_nan() => v,
        _ => default,
    };
    if v.is_nan() {
        return 0.0;
    }
    v.clamp(0.0, 1.0)
}

/// Coerces a loosely-typed JSON value and clamps it into `[0, 1]`.
pub fn clamp01(value: Option<&Value>, default: f64) -> f64 {
    clamp_unit(value.and_then(coerce_f64), default)
}

/// Rebuilds a direction from whatever `x`, `y`, `z` are present.
///
/// Each axis independently falls back to 0. No magnitude constraint is applied.
pub fn coerce_direction(value: Option<&Value>) -> Direction {
    let Some(obj) = value.and_then(Value::as_object) else {
        return Direction::default();
    };
    let axis = |k: &str| obj.get(k).and_then(coerce_finite).unwrap_or(0.0);
    Direction {
        x: axis("x"),
        y: axis("y"),
        z: axis("z"),
    }
}

/// Reads the candidate's intent label as text, trimmed. Missing or null reads as empty.
fn raw_intent(obj: &Map<String, Value>) -> String {
    match obj.get("intent") {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.trim().to_string(),
        Some(other) => other.to_string().trim().to_string(),
    }
}

fn text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Normalizes a candidate Meaning object.
///
/// Fails with [`InvalidMeaning::NotAnObject`] for non-object input and with
/// [`InvalidMeaning::UnsupportedIntent`] when the trimmed intent is outside the whitelist.
/// Every numeric parameter is coerced, defaulted on failure or NaN, and clamped into
/// `[0, 1]`; `debug` survives only if it is already an object.
pub fn validate_meaning(
    candidate: &Value,
    source: &str,
    target: &str,
    defaults: &NormalizerDefaults,
) -> Result<MeaningRecord, InvalidMeaning> {
    let obj = candidate.as_object().ok_or(InvalidMeaning::NotAnObject)?;

    let intent = raw_intent(obj)
        .parse::<Intent>()
        .map_err(InvalidMeaning::UnsupportedIntent)?;

    let empty = Map::new();
    let params = obj
        .get("params")
        .and_then(Value::as_object)
        .unwrap_or(&empty);

    let debug = obj
        .get("debug")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();

    let (source_language, target_language) = languages(source, target);
    Ok(MeaningRecord {
        schema_version: SCHEMA_VERSION.to_string(),
        source_language,
        target_language,
        intent,
        params: MeaningParams {
            direction: coerce_direction(params.get("direction")),
            intensity: clamp01(params.get("intensity"), defaults.intensity),
            tempo: clamp01(params.get("tempo"), defaults.tempo),
            politeness: clamp01(params.get("politeness"), defaults.politeness),
        },
        confidence: clamp01(obj.get("confidence"), defaults.confidence),
        rationale: text(obj.get("rationale")),
        debug,
    })
}
