//! Rule-based intent ladders.
//!
//! Two independent classifiers serve two input shapes: [`classify_clip`] reads
//! [`ClipFeatures`] from a full skeleton clip, [`classify_summary`] reads the coarse
//! [`SummarySignals`]. They can disagree on the same gesture; neither defers to the other.
//!
//! Each ladder is an ordered rule table evaluated top to bottom. The first rule whose guard
//! holds decides; order is part of the contract.

use tracing::debug;

use crate::calibration::{ClipCalibration, SummaryCalibration};
use crate::features::{ClipFeatures, SummarySignals};
use crate::meaning::Intent;

/// Outcome of a ladder.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decision {
    pub intent: Intent,
    pub confidence: f64,
    pub rationale: &'static str,
}

struct Rule<S, C> {
    intent: Intent,
    rationale: &'static str,
    confidence: fn(&C) -> f64,
    matches: fn(&S, &C) -> bool,
}

fn first_match<S, C>(rules: &[Rule<S, C>], signals: &S, cal: &C) -> Option<Decision> {
    rules
        .iter()
        .find(|r| (r.matches)(signals, cal))
        .map(|r| Decision {
            intent: r.intent,
            confidence: (r.confidence)(cal),
            rationale: r.rationale,
        })
}

const CLIP_RULES: &[Rule<ClipFeatures, ClipCalibration>] = &[
    Rule {
        intent: Intent::Yes,
        rationale: "Head nod detected",
        confidence: |c| c.yes_confidence,
        matches: |f, c| f.head_nod > c.yes_min_nod && f.head_shake < c.yes_max_shake,
    },
    Rule {
        intent: Intent::No,
        rationale: "Head shake detected",
        confidence: |c| c.no_confidence,
        matches: |f, c| f.head_shake > c.no_min_shake && f.head_nod < c.no_max_nod,
    },
    Rule {
        intent: Intent::Greeting,
        rationale: "Wrist wave detected",
        confidence: |c| c.greeting_confidence,
        matches: |f, c| {
            f.wave_count >= c.greeting_min_wave_count && f.tempo >= c.greeting_min_tempo
        },
    },
    Rule {
        intent: Intent::SlowDown,
        rationale: "Both hands moved down slowly",
        confidence: |c| c.slow_down_confidence,
        matches: |f, c| {
            f.both_hands_descending
                && f.tempo < c.slow_down_max_tempo
                && f.intensity < c.slow_down_max_intensity
        },
    },
    Rule {
        intent: Intent::Warning,
        rationale: "High intensity motion",
        confidence: |c| c.warning_confidence,
        matches: |f, c| f.intensity > c.warning_min_intensity && f.tempo > c.warning_min_tempo,
    },
    Rule {
        intent: Intent::Thanks,
        rationale: "Calm motion near chest",
        confidence: |c| c.thanks_confidence,
        matches: |f, c| {
            f.closeness > c.thanks_min_closeness
                && f.intensity < c.thanks_max_intensity
                && f.tempo < c.thanks_max_tempo
        },
    },
    Rule {
        intent: Intent::Where,
        rationale: "Hands apart posture",
        confidence: |c| c.where_confidence,
        matches: |f, c| f.hands_apart && f.tempo < c.where_max_tempo,
    },
];

/// Classifies a clip from its aggregated features. Falls through to `request`.
///
/// Clips below the minimum frame count never reach this ladder; see
/// [`crate::MeaningRecord::insufficient_frames`].
pub fn classify_clip(features: &ClipFeatures, cal: &ClipCalibration) -> Decision {
    let decision = first_match(CLIP_RULES, features, cal).unwrap_or(Decision {
        intent: Intent::Request,
        confidence: cal.default_confidence,
        rationale: "Default: request",
    });
    debug!(intent = %decision.intent, rationale = decision.rationale, "clip ladder decided");
    decision
}

const SUMMARY_RULES: &[Rule<SummarySignals, SummaryCalibration>] = &[
    Rule {
        intent: Intent::Warning,
        rationale: "Both hands with large displacement",
        confidence: |c| c.warning_confidence,
        matches: |s, c| {
            s.both_hands_ratio > c.warning_min_both_hands && s.intensity > c.warning_min_intensity
        },
    },
    Rule {
        intent: Intent::Thanks,
        rationale: "Both hands with slow motion",
        confidence: |c| c.thanks_confidence,
        matches: |s, c| {
            s.both_hands_ratio > c.thanks_min_both_hands && s.tempo < c.thanks_max_tempo
        },
    },
    Rule {
        intent: Intent::Request,
        rationale: "Fast, large motion",
        confidence: |c| c.request_confidence,
        matches: |s, c| s.tempo > c.request_min_tempo && s.intensity > c.request_min_intensity,
    },
    Rule {
        intent: Intent::Yes,
        rationale: "One hand with small displacement",
        confidence: |c| c.yes_confidence,
        matches: |s, c| {
            s.both_hands_ratio < c.one_handed_max_both_hands
                && s.intensity < c.yes_no_intensity_split
        },
    },
    Rule {
        intent: Intent::No,
        rationale: "One hand with larger displacement",
        confidence: |c| c.no_confidence,
        matches: |s, c| {
            s.both_hands_ratio < c.one_handed_max_both_hands
                && s.intensity >= c.yes_no_intensity_split
        },
    },
];

/// Classifies a pre-aggregated feature summary. Falls through to `greeting`.
pub fn classify_summary(signals: &SummarySignals, cal: &SummaryCalibration) -> Decision {
    let decision = first_match(SUMMARY_RULES, signals, cal).unwrap_or(Decision {
        intent: Intent::Greeting,
        confidence: cal.default_confidence,
        rationale: "Default: greeting",
    });
    debug!(intent = %decision.intent, rationale = decision.rationale, "summary ladder decided");
    decision
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::Hand;
    use crate::geometry::Vec3;
    use crate::meaning::Direction;

    fn calm() -> ClipFeatures {
        ClipFeatures {
            frame_count: 30,
            dominant: Hand::Left,
            avg_speed_left: 0.0,
            avg_speed_right: 0.0,
            mean_speed: 0.0,
            p90_speed: 0.0,
            direction: Vec3::zero(),
            tempo: 0.1,
            intensity: 0.1,
            chest: None,
            closeness: 0.0,
            politeness: 0.7,
            head_nod: 0.0,
            head_shake: 0.0,
            wave_count: 0,
            both_hands_descending: false,
            hands_apart: false,
        }
    }

    fn clip(f: ClipFeatures) -> Decision {
        classify_clip(&f, &ClipCalibration::default())
    }

    #[test]
    fn calm_clip_defaults_to_request() {
        let d = clip(calm());
        assert_eq!(d.intent, Intent::Request);
        assert_eq!(d.confidence, 0.55);
    }

    #[test]
    fn head_nod_wins_over_everything_else() {
        let d = clip(ClipFeatures {
            head_nod: 0.05,
            head_shake: 0.01,
            wave_count: 6,
            tempo: 0.9,
            intensity: 0.9,
            hands_apart: true,
            ..calm()
        });
        assert_eq!(d.intent, Intent::Yes);
        assert_eq!(d.confidence, 0.75);
    }

    #[test]
    fn head_shake_needs_still_nod() {
        let shake = ClipFeatures {
            head_shake: 0.05,
            head_nod: 0.01,
            ..calm()
        };
        assert_eq!(clip(shake.clone()).intent, Intent::No);

        // Both axes moving: neither head rule fires.
        let both = ClipFeatures {
            head_nod: 0.05,
            ..shake
        };
        assert_eq!(clip(both).intent, Intent::Request);
    }

    #[test]
    fn wave_requires_count_and_tempo() {
        let wave = ClipFeatures {
            wave_count: 4,
            tempo: 0.25,
            ..calm()
        };
        let d = clip(wave.clone());
        assert_eq!(d.intent, Intent::Greeting);
        assert_eq!(d.confidence, 0.70);

        assert_eq!(clip(ClipFeatures { wave_count: 3, ..wave.clone() }).intent, Intent::Request);
        assert_eq!(clip(ClipFeatures { tempo: 0.2, ..wave }).intent, Intent::Request);
    }

    #[test]
    fn slow_descent_is_slow_down() {
        let d = clip(ClipFeatures {
            both_hands_descending: true,
            tempo: 0.3,
            intensity: 0.4,
            ..calm()
        });
        assert_eq!(d.intent, Intent::SlowDown);
        assert_eq!(d.confidence, 0.65);
    }

    #[test]
    fn intense_fast_motion_is_warning() {
        let d = clip(ClipFeatures {
            tempo: 0.5,
            intensity: 0.8,
            both_hands_descending: true,
            ..calm()
        });
        assert_eq!(d.intent, Intent::Warning);
        assert_eq!(d.confidence, 0.62);
    }

    #[test]
    fn calm_near_chest_is_thanks_before_where() {
        let d = clip(ClipFeatures {
            closeness: 0.6,
            hands_apart: true,
            ..calm()
        });
        assert_eq!(d.intent, Intent::Thanks);
        assert_eq!(d.confidence, 0.60);
    }

    #[test]
    fn hands_apart_is_where() {
        let d = clip(ClipFeatures {
            hands_apart: true,
            tempo: 0.59,
            ..calm()
        });
        assert_eq!(d.intent, Intent::Where);
        assert_eq!(d.confidence, 0.58);
        assert_eq!(d.rationale, "Hands apart posture");
    }

    fn summary(both: f64, tempo: f64, intensity: f64) -> Decision {
        classify_summary(
            &SummarySignals {
                tempo,
                intensity,
                both_hands_ratio: both,
                direction: Direction::default(),
            },
            &SummaryCalibration::default(),
        )
    }

    #[test]
    fn summary_ladder_order() {
        assert_eq!(summary(0.8, 0.9, 0.7).intent, Intent::Warning);
        assert_eq!(summary(0.8, 0.2, 0.3).intent, Intent::Thanks);
        assert_eq!(summary(0.5, 0.8, 0.6).intent, Intent::Request);
        assert_eq!(summary(0.2, 0.5, 0.1).intent, Intent::Yes);
        assert_eq!(summary(0.2, 0.5, 0.25).intent, Intent::No);
        assert_eq!(summary(0.5, 0.45, 0.35).intent, Intent::Greeting);
    }

    #[test]
    fn summary_confidences() {
        assert_eq!(summary(0.8, 0.9, 0.7).confidence, 0.70);
        assert_eq!(summary(0.8, 0.2, 0.3).confidence, 0.66);
        assert_eq!(summary(0.5, 0.8, 0.6).confidence, 0.64);
        assert_eq!(summary(0.2, 0.5, 0.1).confidence, 0.60);
        assert_eq!(summary(0.5, 0.45, 0.35).confidence, 0.62);
    }
}
