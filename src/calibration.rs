//! Versioned calibration tables.
//!
//! Every threshold, scale and rule confidence used by the extractors and both intent ladders
//! lives here so recalibration never touches control flow. The [`Default`] values are the
//! shipped calibration, tuned for normalized capture coordinates.

use serde::{Deserialize, Serialize};

use crate::error::CalibrationError;

/// Version tag of the shipped calibration.
pub const CALIBRATION_VERSION: &str = "stage4-heuristic-1";

/// The complete set of tunable constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Calibration {
    pub version: String,
    pub clip: ClipCalibration,
    pub summary: SummaryCalibration,
    pub normalizer: NormalizerDefaults,
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            version: CALIBRATION_VERSION.to_string(),
            clip: ClipCalibration::default(),
            summary: SummaryCalibration::default(),
            normalizer: NormalizerDefaults::default(),
        }
    }
}

impl Calibration {
    /// Loads a calibration table from JSON. Missing fields keep their shipped defaults.
    ///
    /// The table is checked with [`Calibration::validate`] before it is returned.
    pub fn from_json_str(raw: &str) -> Result<Self, CalibrationError> {
        let cal: Self = serde_json::from_str(raw)?;
        cal.validate()?;
        Ok(cal)
    }

    /// Rejects tables whose values would end up in a record outside `[0, 1]`, and
    /// non-positive scales.
    pub fn validate(&self) -> Result<(), CalibrationError> {
        let c = &self.clip;
        let s = &self.summary;
        let n = &self.normalizer;

        let unit = [
            ("clip.fallback_intensity", c.fallback_intensity),
            ("clip.fallback_tempo", c.fallback_tempo),
            ("clip.fallback_politeness", c.fallback_politeness),
            ("clip.fallback_confidence", c.fallback_confidence),
            ("clip.intensity_percentile", c.intensity_percentile),
            ("clip.yes_confidence", c.yes_confidence),
            ("clip.no_confidence", c.no_confidence),
            ("clip.greeting_confidence", c.greeting_confidence),
            ("clip.slow_down_confidence", c.slow_down_confidence),
            ("clip.warning_confidence", c.warning_confidence),
            ("clip.thanks_confidence", c.thanks_confidence),
            ("clip.where_confidence", c.where_confidence),
            ("clip.default_confidence", c.default_confidence),
            ("summary.default_tempo", s.default_tempo),
            ("summary.default_intensity", s.default_intensity),
            ("summary.default_both_hands_ratio", s.default_both_hands_ratio),
            ("summary.politeness", s.politeness),
            ("summary.warning_confidence", s.warning_confidence),
            ("summary.thanks_confidence", s.thanks_confidence),
            ("summary.request_confidence", s.request_confidence),
            ("summary.yes_confidence", s.yes_confidence),
            ("summary.no_confidence", s.no_confidence),
            ("summary.default_confidence", s.default_confidence),
            ("normalizer.intensity", n.intensity),
            ("normalizer.tempo", n.tempo),
            ("normalizer.politeness", n.politeness),
            ("normalizer.confidence", n.confidence),
        ];
        let scales = [
            ("clip.tempo_scale", c.tempo_scale),
            ("clip.intensity_scale", c.intensity_scale),
            ("clip.closeness_reach", c.closeness_reach),
        ];

        let bad_unit = unit.into_iter().find(|(_, v)| !(0.0..=1.0).contains(v));
        let bad_scale = scales.into_iter().find(|(_, v)| !(v.is_finite() && *v > 0.0));
        match bad_unit.or(bad_scale) {
            Some((field, value)) => Err(CalibrationError::OutOfRange { field, value }),
            None => Ok(()),
        }
    }
}

/// Constants for the full-clip path: feature aggregation and the clip intent ladder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClipCalibration {
    /// Clips shorter than this short-circuit to the degraded fallback record.
    pub min_frames: usize,
    pub fallback_intensity: f64,
    pub fallback_tempo: f64,
    pub fallback_politeness: f64,
    pub fallback_confidence: f64,

    /// Mean combined wrist speed that maps to tempo 1.0.
    pub tempo_scale: f64,
    /// High-percentile wrist speed that maps to intensity 1.0.
    pub intensity_scale: f64,
    pub intensity_percentile: f64,
    /// Mean wrist-to-chest distance at which closeness reaches 0.
    pub closeness_reach: f64,

    pub politeness_base: f64,
    pub politeness_closeness_weight: f64,
    pub politeness_intensity_weight: f64,
    pub politeness_tempo_weight: f64,

    /// Minimum start→end y displacement (+y is down) for each wrist to count as descending.
    pub descend_min_dy: f64,
    /// Minimum mean |x| separation between wrists for "hands apart".
    pub hands_apart_min_separation: f64,

    // Rule ladder, in evaluation order.
    pub yes_min_nod: f64,
    pub yes_max_shake: f64,
    pub yes_confidence: f64,

    pub no_min_shake: f64,
    pub no_max_nod: f64,
    pub no_confidence: f64,

    pub greeting_min_wave_count: usize,
    pub greeting_min_tempo: f64,
    pub greeting_confidence: f64,

    pub slow_down_max_tempo: f64,
    pub slow_down_max_intensity: f64,
    pub slow_down_confidence: f64,

    pub warning_min_intensity: f64,
    pub warning_min_tempo: f64,
    pub warning_confidence: f64,

    pub thanks_min_closeness: f64,
    pub thanks_max_intensity: f64,
    pub thanks_max_tempo: f64,
    pub thanks_confidence: f64,

    pub where_max_tempo: f64,
    pub where_confidence: f64,

    pub default_confidence: f64,
}

impl Default for ClipCalibration {
    fn default() -> Self {
        Self {
            min_frames: 2,
            fallback_intensity: 0.2,
            fallback_tempo: 0.2,
            fallback_politeness: 0.7,
            fallback_confidence: 0.4,

            tempo_scale: 1.2,
            intensity_scale: 2.0,
            intensity_percentile: 0.9,
            closeness_reach: 0.8,

            politeness_base: 0.7,
            politeness_closeness_weight: 0.3,
            politeness_intensity_weight: 0.5,
            politeness_tempo_weight: 0.2,

            descend_min_dy: 0.08,
            hands_apart_min_separation: 0.45,

            yes_min_nod: 0.035,
            yes_max_shake: 0.03,
            yes_confidence: 0.75,

            no_min_shake: 0.04,
            no_max_nod: 0.03,
            no_confidence: 0.75,

            greeting_min_wave_count: 4,
            greeting_min_tempo: 0.25,
            greeting_confidence: 0.70,

            slow_down_max_tempo: 0.35,
            slow_down_max_intensity: 0.45,
            slow_down_confidence: 0.65,

            warning_min_intensity: 0.75,
            warning_min_tempo: 0.45,
            warning_confidence: 0.62,

            thanks_min_closeness: 0.55,
            thanks_max_intensity: 0.45,
            thanks_max_tempo: 0.55,
            thanks_confidence: 0.60,

            where_max_tempo: 0.6,
            where_confidence: 0.58,

            default_confidence: 0.55,
        }
    }
}

/// Constants for the pre-aggregated feature summary path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryCalibration {
    /// Substituted when `motion.speedNorm` is missing or not numeric.
    pub default_tempo: f64,
    /// Substituted when `motion.dispNorm` is missing or not numeric.
    pub default_intensity: f64,
    pub default_both_hands_ratio: f64,
    /// The summary carries no posture cue, so politeness is fixed.
    pub politeness: f64,

    pub warning_min_both_hands: f64,
    pub warning_min_intensity: f64,
    pub warning_confidence: f64,

    pub thanks_min_both_hands: f64,
    pub thanks_max_tempo: f64,
    pub thanks_confidence: f64,

    pub request_min_tempo: f64,
    pub request_min_intensity: f64,
    pub request_confidence: f64,

    /// Below this ratio the gesture is treated as one-handed (yes / no).
    pub one_handed_max_both_hands: f64,
    /// Split point between yes (below) and no (at or above).
    pub yes_no_intensity_split: f64,
    pub yes_confidence: f64,
    pub no_confidence: f64,

    pub default_confidence: f64,
}

impl Default for SummaryCalibration {
    fn default() -> Self {
        Self {
            default_tempo: 0.45,
            default_intensity: 0.35,
            default_both_hands_ratio: 0.5,
            politeness: 0.55,

            warning_min_both_hands: 0.7,
            warning_min_intensity: 0.6,
            warning_confidence: 0.70,

            thanks_min_both_hands: 0.6,
            thanks_max_tempo: 0.35,
            thanks_confidence: 0.66,

            request_min_tempo: 0.7,
            request_min_intensity: 0.55,
            request_confidence: 0.64,

            one_handed_max_both_hands: 0.35,
            yes_no_intensity_split: 0.25,
            yes_confidence: 0.60,
            no_confidence: 0.60,

            default_confidence: 0.62,
        }
    }
}

/// Values the validator substitutes when a candidate field is missing, non-numeric or NaN.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerDefaults {
    pub intensity: f64,
    pub tempo: f64,
    pub politeness: f64,
    pub confidence: f64,
}

impl Default for NormalizerDefaults {
    fn default() -> Self {
        Self {
            intensity: 0.35,
            tempo: 0.45,
            politeness: 0.55,
            confidence: 0.0,
        }
    }
}
