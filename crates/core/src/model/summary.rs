use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::quiz::QuizItem;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizSummaryError {
    #[error("completed_at is before started_at")]
    InvalidTimeRange,

    #[error("correct answers ({correct}) exceed total items ({total})")]
    CountMismatch { total: usize, correct: usize },
}

/// Aggregate result for a completed quiz, handed to the results view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizSummary {
    started_at: DateTime<Utc>,
    completed_at: DateTime<Utc>,
    total: usize,
    correct: usize,
    unanswered: usize,
}

impl QuizSummary {
    /// Build a summary from the final quiz items.
    ///
    /// # Errors
    ///
    /// Returns `QuizSummaryError::InvalidTimeRange` if `completed_at` is before `started_at`.
    pub fn from_items(
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
        items: &[QuizItem],
    ) -> Result<Self, QuizSummaryError> {
        let correct = items.iter().filter(|item| item.is_correct()).count();
        let unanswered = items.iter().filter(|item| !item.is_answered()).count();
        Self::from_counts(started_at, completed_at, items.len(), correct, unanswered)
    }

    /// # Errors
    ///
    /// Returns `QuizSummaryError` if the time range or counts are inconsistent.
    pub fn from_counts(
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
        total: usize,
        correct: usize,
        unanswered: usize,
    ) -> Result<Self, QuizSummaryError> {
        if completed_at < started_at {
            return Err(QuizSummaryError::InvalidTimeRange);
        }
        if correct + unanswered > total {
            return Err(QuizSummaryError::CountMismatch { total, correct });
        }
        Ok(Self {
            started_at,
            completed_at,
            total,
            correct,
            unanswered,
        })
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.total
    }

    #[must_use]
    pub fn correct(&self) -> usize {
        self.correct
    }

    #[must_use]
    pub fn incorrect(&self) -> usize {
        self.total - self.correct
    }

    /// Items the user skipped over without ever recording an answer.
    #[must_use]
    pub fn unanswered(&self) -> usize {
        self.unanswered
    }
}
