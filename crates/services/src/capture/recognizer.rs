use async_trait::async_trait;
use quiz_core::model::{LandmarkFrame, PredictionCandidate};
use tracing::debug;

use crate::capture::Frame;
use crate::error::CaptureError;

/// One `(categoryName, confidence)` pair from a local gesture classifier.
#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    pub name: String,
    pub score: f64,
}

impl Category {
    #[must_use]
    pub fn new(name: impl Into<String>, score: f64) -> Self {
        Self {
            name: name.into(),
            score,
        }
    }
}

/// Vision model producing pose keypoints for sequence mode.
#[async_trait]
pub trait LandmarkExtractor: Send {
    /// # Errors
    ///
    /// Returns `CaptureError::Processing` if the model fails on this frame.
    async fn extract(&mut self, frame: &Frame) -> Result<LandmarkFrame, CaptureError>;

    /// Releases the model instance. Must complete before another instance is created.
    async fn close(&mut self);
}

/// Local single-frame classifier for discrete mode.
#[async_trait]
pub trait GestureClassifier: Send {
    /// # Errors
    ///
    /// Returns `CaptureError::Processing` if classification fails on this frame.
    async fn classify(
        &mut self,
        frame: &Frame,
        timestamp_ms: i64,
    ) -> Result<Vec<Category>, CaptureError>;

    /// Releases the model instance. Must complete before another instance is created.
    async fn close(&mut self);
}

/// Converts classifier categories, dropping any with an invalid score.
#[must_use]
pub fn categories_to_candidates(categories: Vec<Category>) -> Vec<PredictionCandidate> {
    categories
        .into_iter()
        .filter_map(|category| {
            PredictionCandidate::new(category.name, category.score)
                .inspect_err(|e| debug!("dropping category: {e}"))
                .ok()
        })
        .collect()
}
