//! LIMEN meaning estimation engine.
//!
//! This crate turns a signed gesture into a bounded [`MeaningRecord`]:
//! - [`estimate_from_clip`]: kinematic features over a full [`SkeletonClip`], then the clip
//!   intent ladder.
//! - [`estimate_from_feature_summary`]: the coarser ladder over a pre-aggregated
//!   [`FeatureSummary`].
//! - [`validate_meaning`]: the trust boundary every externally sourced candidate passes
//!   through.
//!
//! [`MeaningEngine`] bundles a [`Calibration`] with an optional external [`MeaningSource`] and
//! applies the caller-level policy around it ([`MeaningEngine::estimate`]).

pub mod calibration;
pub mod classifier;
pub mod coerce;
pub mod error;
pub mod features;
pub mod geometry;
pub mod kinematics;
pub mod meaning;
pub mod skeleton;
pub mod source;
pub mod validate;

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use tracing::{debug, warn};

pub use calibration::{Calibration, ClipCalibration, NormalizerDefaults, SummaryCalibration};
pub use classifier::{classify_clip, classify_summary, Decision};
pub use error::{CalibrationError, EngineError, InvalidMeaning};
pub use features::{ClipFeatures, FeatureSummary, SummarySignals};
pub use geometry::Vec3;
pub use meaning::{
    Direction, Intent, MeaningParams, MeaningRecord, DEFAULT_SOURCE_LANGUAGE,
    DEFAULT_TARGET_LANGUAGE, SCHEMA_VERSION,
};
pub use skeleton::{Frame, SkeletonClip};
pub use source::{MeaningSource, SourceError};

/// Default bound on a single external source call.
pub const DEFAULT_SOURCE_TIMEOUT: Duration = Duration::from_secs(10);

/// Engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub calibration: Calibration,
    /// Upper bound on one [`MeaningSource::estimate`] call before falling back locally.
    pub source_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            calibration: Calibration::default(),
            source_timeout: DEFAULT_SOURCE_TIMEOUT,
        }
    }
}

/// Meaning estimation façade.
///
/// Stateless apart from its configuration: every call works only on its arguments, so one
/// engine can be shared across threads and tasks.
#[derive(Clone, Default)]
pub struct MeaningEngine {
    config: EngineConfig,
    source: Option<Arc<dyn MeaningSource>>,
}

impl std::fmt::Debug for MeaningEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MeaningEngine")
            .field("calibration_version", &self.config.calibration.version)
            .field("source_timeout", &self.config.source_timeout)
            .field("source", &self.source.as_ref().map(|s| s.name().to_string()))
            .finish()
    }
}

impl MeaningEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            source: None,
        }
    }

    /// Attaches an external meaning source consulted by [`MeaningEngine::estimate`].
    pub fn with_source(mut self, source: Arc<dyn MeaningSource>) -> Self {
        self.source = Some(source);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Full-clip estimation (kinematics + clip ladder).
    #[tracing::instrument(skip_all, fields(frames = clip.len()))]
    pub fn estimate_from_clip(
        &self,
        clip: &SkeletonClip,
        source: &str,
        target: &str,
    ) -> MeaningRecord {
        clip_record(clip, source, target, &self.config.calibration.clip)
    }

    /// Pre-aggregated estimation (summary ladder).
    #[tracing::instrument(skip_all)]
    pub fn estimate_from_feature_summary(
        &self,
        summary: &FeatureSummary,
        source: &str,
        target: &str,
    ) -> MeaningRecord {
        summary_record(summary, source, target, &self.config.calibration)
    }

    /// Normalizes an untrusted candidate using this engine's normalizer defaults.
    pub fn validate_meaning(
        &self,
        candidate: &Value,
        source: &str,
        target: &str,
    ) -> Result<MeaningRecord, InvalidMeaning> {
        validate::validate_meaning(
            candidate,
            source,
            target,
            &self.config.calibration.normalizer,
        )
    }

    /// Estimates through the configured external source, with local fallback.
    ///
    /// - No source, source error, timeout, or a non-object candidate: summary ladder.
    /// - Candidate with an intent outside the whitelist: an `unknown` record with zero
    ///   confidence. The local ladder is not used to paper over the disagreement.
    /// - Otherwise: the validated candidate.
    #[tracing::instrument(skip_all, fields(source_language = source, target_language = target))]
    pub async fn estimate(
        &self,
        summary: &FeatureSummary,
        source: &str,
        target: &str,
    ) -> MeaningRecord {
        let Some(model) = &self.source else {
            return self.estimate_from_feature_summary(summary, source, target);
        };

        let timeout = self.config.source_timeout;
        let candidate = match tokio::time::timeout(timeout, model.estimate(summary)).await {
            Ok(Ok(candidate)) => candidate,
            Ok(Err(err)) => {
                warn!(
                    source = model.name(),
                    error = %err,
                    "meaning source failed, using local heuristic"
                );
                return self.estimate_from_feature_summary(summary, source, target);
            }
            Err(_) => {
                let err = SourceError::Timeout(timeout);
                warn!(
                    source = model.name(),
                    error = %err,
                    "meaning source failed, using local heuristic"
                );
                return self.estimate_from_feature_summary(summary, source, target);
            }
        };

        match self.validate_meaning(&candidate, source, target) {
            Ok(mut record) => {
                record.debug.insert("source".to_string(), json!(model.name()));
                debug!(source = model.name(), intent = %record.intent, "accepted source candidate");
                record
            }
            Err(InvalidMeaning::UnsupportedIntent(raw)) => {
                warn!(
                    source = model.name(),
                    intent = %raw,
                    "meaning source returned unsupported intent"
                );
                MeaningRecord::unsupported_intent(
                    source,
                    target,
                    &raw,
                    &self.config.calibration.normalizer,
                )
            }
            Err(err) => {
                warn!(
                    source = model.name(),
                    error = %err,
                    "rejected source candidate, using local heuristic"
                );
                self.estimate_from_feature_summary(summary, source, target)
            }
        }
    }

    /// Estimates independent clips in parallel on the blocking pool. Output order follows
    /// input order.
    pub async fn estimate_clips(
        &self,
        clips: Vec<SkeletonClip>,
        source: &str,
        target: &str,
    ) -> Result<Vec<MeaningRecord>, EngineError> {
        let cal = Arc::new(self.config.calibration.clip.clone());
        let handles: Vec<_> = clips
            .into_iter()
            .map(|clip| {
                let cal = Arc::clone(&cal);
                let (source, target) = (source.to_string(), target.to_string());
                tokio::task::spawn_blocking(move || clip_record(&clip, &source, &target, &cal))
            })
            .collect();

        let mut records = Vec::with_capacity(handles.len());
        for handle in handles {
            records.push(handle.await?);
        }
        Ok(records)
    }
}

fn clip_record(
    clip: &SkeletonClip,
    source: &str,
    target: &str,
    cal: &ClipCalibration,
) -> MeaningRecord {
    if clip.len() < cal.min_frames {
        debug!(frames = clip.len(), "not enough frames, using fallback record");
        return MeaningRecord::insufficient_frames(source, target, clip.len(), cal);
    }

    let features = ClipFeatures::extract(clip, cal);
    let decision = classify_clip(&features, cal);

    let (source_language, target_language) = meaning::languages(source, target);
    MeaningRecord {
        schema_version: SCHEMA_VERSION.to_string(),
        source_language,
        target_language,
        intent: decision.intent,
        params: MeaningParams {
            direction: features.direction.into(),
            intensity: features.intensity,
            tempo: features.tempo,
            politeness: features.politeness,
        },
        confidence: decision.confidence.clamp(0.0, 1.0),
        rationale: decision.rationale.to_string(),
        debug: features.debug_map(),
    }
}

fn summary_record(
    summary: &FeatureSummary,
    source: &str,
    target: &str,
    cal: &Calibration,
) -> MeaningRecord {
    let signals = summary.signals(&cal.summary);
    let decision = classify_summary(&signals, &cal.summary);

    let mut debug = serde_json::Map::new();
    debug.insert("bothHandsRatio".to_string(), json!(signals.both_hands_ratio));
    debug.insert("tempo".to_string(), json!(signals.tempo));
    debug.insert("intensity".to_string(), json!(signals.intensity));
    debug.insert("calibration".to_string(), json!(cal.version));

    let (source_language, target_language) = meaning::languages(source, target);
    MeaningRecord {
        schema_version: SCHEMA_VERSION.to_string(),
        source_language,
        target_language,
        intent: decision.intent,
        params: MeaningParams {
            direction: signals.direction,
            intensity: signals.intensity,
            tempo: signals.tempo,
            politeness: cal.summary.politeness.clamp(0.0, 1.0),
        },
        confidence: decision.confidence.clamp(0.0, 1.0),
        rationale: decision.rationale.to_string(),
        debug,
    }
}

/// [`MeaningEngine::estimate_from_clip`] with the shipped calibration.
pub fn estimate_from_clip(clip: &SkeletonClip, source: &str, target: &str) -> MeaningRecord {
    clip_record(clip, source, target, &ClipCalibration::default())
}

/// [`MeaningEngine::estimate_from_feature_summary`] with the shipped calibration.
pub fn estimate_from_feature_summary(
    summary: &FeatureSummary,
    source: &str,
    target: &str,
) -> MeaningRecord {
    summary_record(summary, source, target, &Calibration::default())
}

/// [`MeaningEngine::validate_meaning`] with the shipped normalizer defaults.
pub fn validate_meaning(
    candidate: &Value,
    source: &str,
    target: &str,
) -> Result<MeaningRecord, InvalidMeaning> {
    validate::validate_meaning(candidate, source, target, &NormalizerDefaults::default())
}
