//! The Meaning record: the engine's sole output artifact.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::calibration::{ClipCalibration, NormalizerDefaults};
use crate::geometry::Vec3;

/// Fixed schema tag carried by every record.
pub const SCHEMA_VERSION: &str = "0.1.0";

/// Source language recorded when the caller passes a blank one.
pub const DEFAULT_SOURCE_LANGUAGE: &str = "JSL";
/// Target language recorded when the caller passes a blank one.
pub const DEFAULT_TARGET_LANGUAGE: &str = "ASL";

/// Resolves the `(source, target)` language pair, substituting the defaults for blank input.
pub(crate) fn languages(source: &str, target: &str) -> (String, String) {
    let pick = |raw: &str, default: &str| {
        if raw.trim().is_empty() {
            default.to_string()
        } else {
            raw.to_string()
        }
    };
    (
        pick(source, DEFAULT_SOURCE_LANGUAGE),
        pick(target, DEFAULT_TARGET_LANGUAGE),
    )
}

/// Communicative purpose of a gesture.
///
/// Eleven named intents plus the `Unknown` sentinel, which marks a record whose intent could
/// not be trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Greeting,
    IntroduceSelf,
    Thanks,
    Sorry,
    Help,
    Request,
    SlowDown,
    Where,
    Warning,
    Yes,
    No,
    Unknown,
}

impl Intent {
    /// The whitelist accepted at the trust boundary, `Unknown` included.
    pub const ALL: [Intent; 12] = [
        Intent::Greeting,
        Intent::IntroduceSelf,
        Intent::Thanks,
        Intent::Sorry,
        Intent::Help,
        Intent::Request,
        Intent::SlowDown,
        Intent::Where,
        Intent::Warning,
        Intent::Yes,
        Intent::No,
        Intent::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Greeting => "greeting",
            Self::IntroduceSelf => "introduce_self",
            Self::Thanks => "thanks",
            Self::Sorry => "sorry",
            Self::Help => "help",
            Self::Request => "request",
            Self::SlowDown => "slow_down",
            Self::Where => "where",
            Self::Warning => "warning",
            Self::Yes => "yes",
            Self::No => "no",
            Self::Unknown => "unknown",
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown)
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Intent {
    type Err = String;

    /// Exact, case-sensitive match against the whitelist. Callers trim first.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Intent::ALL
            .into_iter()
            .find(|i| i.as_str() == s)
            .ok_or_else(|| s.to_string())
    }
}

/// Direction of motion. Not constrained to unit length.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Direction {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl From<Vec3> for Direction {
    fn from(v: Vec3) -> Self {
        Self {
            x: v.x(),
            y: v.y(),
            z: v.z(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeaningParams {
    pub direction: Direction,
    /// In `[0, 1]`.
    pub intensity: f64,
    /// In `[0, 1]`.
    pub tempo: f64,
    /// In `[0, 1]`.
    pub politeness: f64,
}

/// A bounded, schema-conformant Meaning record.
///
/// Built once per estimation and never updated in place; `debug` is diagnostic only and
/// always safe to drop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeaningRecord {
    pub schema_version: String,
    pub source_language: String,
    pub target_language: String,
    pub intent: Intent,
    pub params: MeaningParams,
    /// In `[0, 1]`.
    pub confidence: f64,
    #[serde(default)]
    pub rationale: String,
    #[serde(default)]
    pub debug: Map<String, Value>,
}

impl MeaningRecord {
    /// Degraded record for clips too short to measure motion.
    pub fn insufficient_frames(
        source: &str,
        target: &str,
        frames: usize,
        cal: &ClipCalibration,
    ) -> Self {
        let mut debug = Map::new();
        debug.insert("frames".to_string(), json!(frames));

        let (source_language, target_language) = languages(source, target);
        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            source_language,
            target_language,
            intent: Intent::Request,
            params: MeaningParams {
                direction: Direction::default(),
                intensity: cal.fallback_intensity.clamp(0.0, 1.0),
                tempo: cal.fallback_tempo.clamp(0.0, 1.0),
                politeness: cal.fallback_politeness.clamp(0.0, 1.0),
            },
            confidence: cal.fallback_confidence.clamp(0.0, 1.0),
            rationale: "Not enough frames; fallback.".to_string(),
            debug,
        }
    }

    /// Record emitted when an external source names an intent outside the whitelist.
    ///
    /// Confidence is zero and the rationale carries the rejected label; the local heuristics
    /// are not consulted.
    pub fn unsupported_intent(
        source: &str,
        target: &str,
        raw_intent: &str,
        defaults: &NormalizerDefaults,
    ) -> Self {
        let mut debug = Map::new();
        debug.insert("rejectedIntent".to_string(), json!(raw_intent));

        let (source_language, target_language) = languages(source, target);
        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            source_language,
            target_language,
            intent: Intent::Unknown,
            params: MeaningParams {
                direction: Direction::default(),
                intensity: defaults.intensity.clamp(0.0, 1.0),
                tempo: defaults.tempo.clamp(0.0, 1.0),
                politeness: defaults.politeness.clamp(0.0, 1.0),
            },
            confidence: 0.0,
            rationale: format!("Rejected unsupported intent from model: {raw_intent}"),
            debug,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intent_labels_round_trip() {
        for intent in Intent::ALL {
            assert_eq!(intent.as_str().parse::<Intent>(), Ok(intent));
            assert_eq!(
                serde_json::to_value(intent).expect("serialize intent"),
                Value::String(intent.as_str().to_string())
            );
        }
        assert_eq!("dance".parse::<Intent>(), Err("dance".to_string()));
        assert!("Greeting".parse::<Intent>().is_err());
    }

    #[test]
    fn whitelist_has_eleven_named_intents() {
        assert_eq!(Intent::ALL.iter().filter(|i| !i.is_unknown()).count(), 11);
    }

    #[test]
    fn record_serializes_camel_case() {
        let cal = ClipCalibration::default();
        let record = MeaningRecord::insufficient_frames("JSL", "ASL", 1, &cal);
        let value = serde_json::to_value(&record).expect("serialize record");

        assert_eq!(value["schemaVersion"], "0.1.0");
        assert_eq!(value["sourceLanguage"], "JSL");
        assert_eq!(value["intent"], "request");
        assert_eq!(value["params"]["direction"], json!({"x": 0.0, "y": 0.0, "z": 0.0}));
        assert_eq!(value["debug"]["frames"], 1);
    }

    #[test]
    fn unsupported_intent_record_is_unknown_with_zero_confidence() {
        let defaults = NormalizerDefaults::default();
        let record = MeaningRecord::unsupported_intent("JSL", "ASL", "dance", &defaults);
        assert_eq!(record.intent, Intent::Unknown);
        assert_eq!(record.confidence, 0.0);
        assert!(record.rationale.contains("dance"));
    }

    #[test]
    fn blank_languages_take_defaults() {
        let cal = ClipCalibration::default();
        let record = MeaningRecord::insufficient_frames("", "  ", 0, &cal);
        assert_eq!(record.source_language, DEFAULT_SOURCE_LANGUAGE);
        assert_eq!(record.target_language, DEFAULT_TARGET_LANGUAGE);

        assert_eq!(
            languages("LSF", "BSL"),
            ("LSF".to_string(), "BSL".to_string())
        );
    }
}
