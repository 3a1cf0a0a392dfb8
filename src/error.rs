//! Error types surfaced by the engine.

use thiserror::Error;

/// A candidate Meaning object failed the trust-boundary check.
///
/// Always recoverable: callers either fall back to local estimation or emit an `unknown`
/// record (see [`crate::MeaningEngine::estimate`]).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidMeaning {
    #[error("not_an_object")]
    NotAnObject,
    /// Carries the trimmed raw intent as received.
    #[error("unsupported_intent:{0}")]
    UnsupportedIntent(String),
}

/// A calibration table could not be loaded.
#[derive(Debug, Error)]
pub enum CalibrationError {
    #[error("malformed calibration table: {0}")]
    Parse(#[from] serde_json::Error),
    /// A probability outside `[0, 1]` or a non-positive scale.
    #[error("calibration field {field} out of range: {value}")]
    OutOfRange { field: &'static str, value: f64 },
}

/// Failure while running a batch of estimations on the blocking pool.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("estimation task failed: {0}")]
    TaskFailed(#[from] tokio::task::JoinError),
}
