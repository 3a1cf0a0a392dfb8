//! Aggregated gesture signals.
//!
//! [`ClipFeatures`] reduces a full skeleton clip to the named signals the clip ladder reads.
//! [`FeatureSummary`] is the coarser, pre-aggregated shape a client may send instead of
//! frames (motion ratios and hand usage only).

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::debug;

use crate::calibration::{ClipCalibration, SummaryCalibration};
use crate::coerce::coerce_f64;
use crate::geometry::Vec3;
use crate::kinematics::{
    average_distance_to, average_separation, joint_series, mean, percentile_nearest_rank,
    sample_std_dev, speed_series, start_end_delta, x_velocity_series, zero_crossings,
};
use crate::meaning::Direction;
use crate::skeleton::{
    joint_at, SkeletonClip, LEFT_SHOULDER, LEFT_WRIST, NOSE, RIGHT_SHOULDER, RIGHT_WRIST,
};
use crate::validate::{clamp_unit, coerce_direction};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hand {
    Left,
    Right,
}

impl Hand {
    pub fn wrist_key(&self) -> &'static str {
        match self {
            Self::Left => LEFT_WRIST,
            Self::Right => RIGHT_WRIST,
        }
    }
}

/// Signals computed from a full clip.
#[derive(Debug, Clone, PartialEq)]
pub struct ClipFeatures {
    pub frame_count: usize,
    /// Wrist with the higher mean speed; left wins ties.
    pub dominant: Hand,
    pub avg_speed_left: f64,
    pub avg_speed_right: f64,
    /// Mean of the combined wrist speed series.
    pub mean_speed: f64,
    pub p90_speed: f64,
    /// Unit start→end displacement of the dominant wrist, zero when undefined.
    pub direction: Vec3,
    pub tempo: f64,
    pub intensity: f64,
    /// Shoulder midpoint in the first frame with both shoulders.
    pub chest: Option<Vec3>,
    pub closeness: f64,
    pub politeness: f64,
    /// Sample std-dev of the nose y coordinate.
    pub head_nod: f64,
    /// Sample std-dev of the nose x coordinate.
    pub head_shake: f64,
    /// Sign changes of the dominant wrist x-velocity.
    pub wave_count: usize,
    pub both_hands_descending: bool,
    pub hands_apart: bool,
}

impl ClipFeatures {
    pub fn extract(clip: &SkeletonClip, cal: &ClipCalibration) -> Self {
        let left_speeds = speed_series(clip, LEFT_WRIST);
        let right_speeds = speed_series(clip, RIGHT_WRIST);

        let avg_speed_left = mean(&left_speeds);
        let avg_speed_right = mean(&right_speeds);
        let dominant = if avg_speed_left >= avg_speed_right {
            Hand::Left
        } else {
            Hand::Right
        };
        let dom_key = dominant.wrist_key();

        let direction = start_end_delta(clip, dom_key)
            .map(|d| d.normalized())
            .unwrap_or_else(Vec3::zero);

        let mut all_speeds: Vec<f64> = left_speeds.into_iter().chain(right_speeds).collect();
        all_speeds.sort_by(f64::total_cmp);
        let mean_speed = mean(&all_speeds);
        let p90_speed = percentile_nearest_rank(&all_speeds, cal.intensity_percentile);

        let tempo = saturate(mean_speed / cal.tempo_scale);
        let intensity = saturate(p90_speed / cal.intensity_scale);

        let chest = clip.frames().iter().find_map(|f| {
            let l = joint_at(f, LEFT_SHOULDER)?;
            let r = joint_at(f, RIGHT_SHOULDER)?;
            Some(l.midpoint(&r))
        });

        let closeness = chest
            .and_then(|c| average_distance_to(clip, dom_key, c))
            .map(|d| saturate(1.0 - d / cal.closeness_reach))
            .unwrap_or(0.0);

        let politeness = saturate(
            cal.politeness_base + cal.politeness_closeness_weight * closeness
                - cal.politeness_intensity_weight * intensity
                - cal.politeness_tempo_weight * tempo,
        );

        let nose = joint_series(clip, NOSE);
        let nose_x: Vec<f64> = nose.iter().map(Vec3::x).collect();
        let nose_y: Vec<f64> = nose.iter().map(Vec3::y).collect();
        let head_shake = sample_std_dev(&nose_x);
        let head_nod = sample_std_dev(&nose_y);

        let wave_count = zero_crossings(&x_velocity_series(clip, dom_key));

        // +y is down in capture space.
        let both_hands_descending = match (
            start_end_delta(clip, LEFT_WRIST),
            start_end_delta(clip, RIGHT_WRIST),
        ) {
            (Some(l), Some(r)) => l.y() > cal.descend_min_dy && r.y() > cal.descend_min_dy,
            _ => false,
        };

        let hands_apart = average_separation(clip, LEFT_WRIST, RIGHT_WRIST)
            .is_some_and(|sep| sep > cal.hands_apart_min_separation);

        let features = Self {
            frame_count: clip.len(),
            dominant,
            avg_speed_left,
            avg_speed_right,
            mean_speed,
            p90_speed,
            direction,
            tempo,
            intensity,
            chest,
            closeness,
            politeness,
            head_nod,
            head_shake,
            wave_count,
            both_hands_descending,
            hands_apart,
        };
        debug!(
            frames = features.frame_count,
            dominant = dom_key,
            tempo = features.tempo,
            intensity = features.intensity,
            head_nod = features.head_nod,
            head_shake = features.head_shake,
            wave_count = features.wave_count,
            "extracted clip features"
        );
        features
    }

    /// Diagnostic key/value view for a record's `debug` map.
    pub fn debug_map(&self) -> Map<String, Value> {
        let mut m = Map::new();
        m.insert("frames".into(), json!(self.frame_count));
        m.insert("domKey".into(), json!(self.dominant.wrist_key()));
        m.insert("avgSpeedL".into(), json!(self.avg_speed_left));
        m.insert("avgSpeedR".into(), json!(self.avg_speed_right));
        m.insert("p90Speed".into(), json!(self.p90_speed));
        m.insert("headNod".into(), json!(self.head_nod));
        m.insert("headShake".into(), json!(self.head_shake));
        m.insert("waveZeroCross".into(), json!(self.wave_count));
        m.insert("closeness".into(), json!(self.closeness));
        m.insert("handsApart".into(), json!(self.hands_apart));
        m.insert("bothDown".into(), json!(self.both_hands_descending));
        m
    }
}

fn saturate(v: f64) -> f64 {
    clamp_unit(Some(v), 0.0)
}

/// Pre-aggregated motion summary, as produced by a client-side feature pass.
///
/// Wire shape: `{"motion": {"speedNorm", "dispNorm", "netDisp"}, "hands": {"bothHandsRatio"}}`.
/// Deserialization is lenient: non-object sections and non-numeric values read as missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value")]
pub struct FeatureSummary {
    pub motion: MotionSummary,
    pub hands: HandsSummary,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MotionSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed_norm: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disp_norm: Option<f64>,
    pub net_disp: Direction,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HandsSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub both_hands_ratio: Option<f64>,
}

impl FeatureSummary {
    pub fn from_value(value: &Value) -> Self {
        let section = |name: &str| value.get(name).and_then(Value::as_object);
        let number = |obj: Option<&Map<String, Value>>, key: &str| {
            obj.and_then(|o| o.get(key)).and_then(coerce_f64)
        };

        let motion = section("motion");
        let hands = section("hands");
        Self {
            motion: MotionSummary {
                speed_norm: number(motion, "speedNorm"),
                disp_norm: number(motion, "dispNorm"),
                net_disp: coerce_direction(motion.and_then(|m| m.get("netDisp"))),
            },
            hands: HandsSummary {
                both_hands_ratio: number(hands, "bothHandsRatio"),
            },
        }
    }

    /// Resolves the summary into bounded ladder inputs, substituting calibrated defaults.
    pub fn signals(&self, cal: &SummaryCalibration) -> SummarySignals {
        SummarySignals {
            tempo: clamp_unit(self.motion.speed_norm, cal.default_tempo),
            intensity: clamp_unit(self.motion.disp_norm, cal.default_intensity),
            both_hands_ratio: clamp_unit(self.hands.both_hands_ratio, cal.default_both_hands_ratio),
            direction: self.motion.net_disp,
        }
    }
}

impl From<Value> for FeatureSummary {
    fn from(value: Value) -> Self {
        FeatureSummary::from_value(&value)
    }
}

/// Bounded inputs to the summary ladder.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SummarySignals {
    pub tempo: f64,
    pub intensity: f64,
    pub both_hands_ratio: f64,
    /// Raw net displacement; not re-normalized.
    pub direction: Direction,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skeleton::Frame;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn right_hand_dominates_when_faster() {
        let clip = SkeletonClip::new(
            (0..5)
                .map(|i| {
                    let t = i as f64 * 0.1;
                    Frame::at(t)
                        .with_joint(LEFT_WRIST, Vec3::new(0.3, 0.5, 0.0))
                        .with_joint(RIGHT_WRIST, Vec3::new(0.5 + 0.02 * i as f64, 0.5, 0.0))
                })
                .collect(),
        );
        let f = ClipFeatures::extract(&clip, &ClipCalibration::default());

        assert_eq!(f.dominant, Hand::Right);
        assert!(close(f.direction.x(), 1.0));
        assert_eq!(f.avg_speed_left, 0.0);
        assert_eq!(f.wave_count, 0);
        assert!(f.chest.is_none());
        assert_eq!(f.closeness, 0.0);
    }

    #[test]
    fn still_hands_tie_to_left_with_zero_direction() {
        let clip = SkeletonClip::new(vec![
            Frame::at(0.0).with_joint(NOSE, Vec3::new(0.5, 0.2, 0.0)),
            Frame::at(0.1).with_joint(NOSE, Vec3::new(0.5, 0.2, 0.0)),
        ]);
        let f = ClipFeatures::extract(&clip, &ClipCalibration::default());

        assert_eq!(f.dominant, Hand::Left);
        assert_eq!(f.direction, Vec3::zero());
        assert_eq!(f.tempo, 0.0);
        assert_eq!(f.intensity, 0.0);
        assert!(close(f.politeness, 0.7));
        assert!(!f.hands_apart);
        assert!(!f.both_hands_descending);
    }

    #[test]
    fn tempo_and_intensity_are_scaled_and_clamped() {
        // Left wrist moves 0.06 per 0.1s = 0.6 units/s.
        let clip = SkeletonClip::new(
            (0..6)
                .map(|i| {
                    Frame::at(i as f64 * 0.1)
                        .with_joint(LEFT_WRIST, Vec3::new(0.06 * i as f64, 0.0, 0.0))
                })
                .collect(),
        );
        let f = ClipFeatures::extract(&clip, &ClipCalibration::default());
        assert!((f.tempo - 0.5).abs() < 1e-6);
        assert!((f.intensity - 0.3).abs() < 1e-6);

        let fast = SkeletonClip::new(
            (0..6)
                .map(|i| {
                    Frame::at(i as f64 * 0.1)
                        .with_joint(LEFT_WRIST, Vec3::new(0.5 * i as f64, 0.0, 0.0))
                })
                .collect(),
        );
        let f = ClipFeatures::extract(&fast, &ClipCalibration::default());
        assert_eq!(f.tempo, 1.0);
        assert_eq!(f.intensity, 1.0);
    }

    #[test]
    fn closeness_measures_dominant_wrist_to_chest() {
        let clip = SkeletonClip::new(
            (0..3)
                .map(|i| {
                    Frame::at(i as f64 * 0.1)
                        .with_joint(LEFT_SHOULDER, Vec3::new(0.4, 0.4, 0.0))
                        .with_joint(RIGHT_SHOULDER, Vec3::new(0.6, 0.4, 0.0))
                        .with_joint(LEFT_WRIST, Vec3::new(0.5, 0.6, 0.0))
                })
                .collect(),
        );
        let f = ClipFeatures::extract(&clip, &ClipCalibration::default());
        let chest = f.chest.expect("shoulders present");
        assert!(close(chest.x(), 0.5));
        // distance 0.2 -> 1 - 0.2 / 0.8
        assert!(close(f.closeness, 0.75));
        assert!(close(f.politeness, 0.7 + 0.3 * 0.75));
    }

    #[test]
    fn descending_and_apart_flags() {
        let clip = SkeletonClip::new(vec![
            Frame::at(0.0)
                .with_joint(LEFT_WRIST, Vec3::new(0.1, 0.3, 0.0))
                .with_joint(RIGHT_WRIST, Vec3::new(0.9, 0.3, 0.0)),
            Frame::at(1.0)
                .with_joint(LEFT_WRIST, Vec3::new(0.1, 0.5, 0.0))
                .with_joint(RIGHT_WRIST, Vec3::new(0.9, 0.5, 0.0)),
        ]);
        let f = ClipFeatures::extract(&clip, &ClipCalibration::default());
        assert!(f.both_hands_descending);
        assert!(f.hands_apart);

        let debug = f.debug_map();
        assert_eq!(debug["bothDown"], true);
        assert_eq!(debug["handsApart"], true);
        assert_eq!(debug["frames"], 2);
        assert_eq!(debug["domKey"], LEFT_WRIST);
    }

    #[test]
    fn summary_parses_leniently() {
        let summary = FeatureSummary::from_value(&serde_json::json!({
            "motion": {"speedNorm": "0.8", "dispNorm": null, "netDisp": {"x": 1.5, "y": "bad"}},
            "hands": "both"
        }));
        assert_eq!(summary.motion.speed_norm, Some(0.8));
        assert_eq!(summary.motion.disp_norm, None);
        assert_eq!(summary.hands.both_hands_ratio, None);
        assert_eq!(summary.motion.net_disp, Direction { x: 1.5, y: 0.0, z: 0.0 });

        let signals = summary.signals(&SummaryCalibration::default());
        assert_eq!(signals.tempo, 0.8);
        assert_eq!(signals.intensity, 0.35);
        assert_eq!(signals.both_hands_ratio, 0.5);
    }

    #[test]
    fn summary_signals_clamp_out_of_range_values() {
        let summary = FeatureSummary::from_value(&serde_json::json!({
            "motion": {"speedNorm": 3.0, "dispNorm": -0.4},
            "hands": {"bothHandsRatio": "NaN"}
        }));
        let signals = summary.signals(&SummaryCalibration::default());
        assert_eq!(signals.tempo, 1.0);
        assert_eq!(signals.intensity, 0.0);
        assert_eq!(signals.both_hands_ratio, 0.5);
    }
}
