//! Classification result model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Confidence assigned to results recovered by heuristic text parsing.
///
/// Fixed regardless of how much of the pattern matched; uncalibrated.
pub const FALLBACK_CONFIDENCE: f64 = 0.7;

/// Confidence used when a strict JSON response omits the field.
pub const DEFAULT_CONFIDENCE: f64 = 0.5;

/// Provenance attached to every classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultMetadata {
    /// Model or agent label that produced the result.
    pub model: String,
    pub timestamp: DateTime<Utc>,
}

impl ResultMetadata {
    pub fn new(model: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            model: model.into(),
            timestamp,
        }
    }

    /// Metadata stamped with the current time.
    pub fn now(model: impl Into<String>) -> Self {
        Self::new(model, Utc::now())
    }
}

/// Whether a piece of user content describes a pain point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationResult {
    pub is_pain_point: bool,
    pub reason: String,
    /// Always within `[0, 1]`.
    pub confidence: f64,
    #[serde(default)]
    pub categories: Vec<String>,
    /// Set when the result came from heuristic parsing; advisory trust only.
    #[serde(default)]
    pub parsed_from_fallback: bool,
    /// Set on the fail-open default.
    #[serde(default)]
    pub error: bool,
    pub metadata: ResultMetadata,
}

impl ClassificationResult {
    /// Builds a result, clamping `confidence` into range.
    pub fn new(
        is_pain_point: bool,
        reason: impl Into<String>,
        confidence: f64,
        categories: Vec<String>,
        metadata: ResultMetadata,
    ) -> Self {
        Self {
            is_pain_point,
            reason: reason.into(),
            confidence: clamp_confidence(confidence),
            categories,
            parsed_from_fallback: false,
            error: false,
            metadata,
        }
    }

    /// Marks the result as recovered by heuristic parsing.
    pub fn from_fallback(mut self) -> Self {
        self.parsed_from_fallback = true;
        self
    }

    /// The safe default returned when classification fails.
    pub fn fail_open(reason: impl Into<String>, metadata: ResultMetadata) -> Self {
        Self {
            is_pain_point: false,
            reason: reason.into(),
            confidence: 0.0,
            categories: Vec::new(),
            parsed_from_fallback: false,
            error: true,
            metadata,
        }
    }
}

/// Clamps a confidence value into `[0, 1]`; NaN becomes 0.
pub fn clamp_confidence(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
