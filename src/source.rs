//! Seam for an external, specialized meaning model.
//!
//! The engine does not know how a source is reached (HTTP, IPC, in-process). It hands over
//! a [`FeatureSummary`] and gets back an untrusted JSON candidate, which always goes through
//! [`crate::validate_meaning`] before use.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::features::FeatureSummary;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    #[error("meaning source unavailable: {0}")]
    Unavailable(String),
    #[error("meaning source timed out after {0:?}")]
    Timeout(Duration),
    #[error("meaning source returned malformed output: {0}")]
    Malformed(String),
}

/// An external producer of candidate Meaning objects.
#[async_trait]
pub trait MeaningSource: Send + Sync {
    /// Short identifier recorded in the resulting record's `debug.source`.
    fn name(&self) -> &str;

    /// Produces a candidate Meaning object for the summary. The output is untrusted.
    async fn estimate(&self, summary: &FeatureSummary) -> Result<Value, SourceError>;
}
