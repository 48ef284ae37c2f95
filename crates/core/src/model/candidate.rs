use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum CandidateError {
    #[error("confidence must be finite and in [0, 1], got {provided}")]
    InvalidConfidence { provided: f64 },
}

/// One `(label, confidence)` guess from a classifier.
///
/// Labels are kept as raw text: out-of-domain labels are legal here and are
/// filtered by scoring, never rejected as errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionCandidate {
    label: String,
    confidence: f64,
}

impl PredictionCandidate {
    /// # Errors
    ///
    /// Returns `CandidateError::InvalidConfidence` for NaN, infinite or out-of-range values.
    pub fn new(label: impl Into<String>, confidence: f64) -> Result<Self, CandidateError> {
        if !confidence.is_finite() || !(0.0..=1.0).contains(&confidence) {
            return Err(CandidateError::InvalidConfidence {
                provided: confidence,
            });
        }
        Ok(Self {
            label: label.into(),
            confidence,
        })
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[must_use]
    pub fn confidence(&self) -> f64 {
        self.confidence
    }
}
