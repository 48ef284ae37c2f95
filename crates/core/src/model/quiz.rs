use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::label::{Label, Verdict};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizError {
    #[error("quiz must contain at least one item")]
    Empty,

    #[error("quiz position {position} is out of range (len {len})")]
    PositionOutOfRange { position: usize, len: usize },
}

//
// ─── QUIZ ITEM ─────────────────────────────────────────────────────────────────
//

/// One question of a quiz: the sign the user is asked to perform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizItem {
    position: usize,
    expected: Label,
    is_correct: bool,
    answer: Option<Verdict>,
}

impl QuizItem {
    #[must_use]
    pub fn position(&self) -> usize {
        self.position
    }

    #[must_use]
    pub fn expected(&self) -> &Label {
        &self.expected
    }

    #[must_use]
    pub fn is_correct(&self) -> bool {
        self.is_correct
    }

    /// The last verdict recorded for this item, if it has been answered.
    #[must_use]
    pub fn answer(&self) -> Option<&Verdict> {
        self.answer.as_ref()
    }

    #[must_use]
    pub fn is_answered(&self) -> bool {
        self.answer.is_some()
    }
}

//
// ─── QUIZ ──────────────────────────────────────────────────────────────────────
//

/// Ordered list of quiz items owned by the quiz flow.
///
/// Items are never removed; grading rewrites an item in place through
/// [`Quiz::record`], which is the only mutation path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quiz {
    items: Vec<QuizItem>,
}

impl Quiz {
    /// Builds a quiz from expected labels, in order.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Empty` if no labels are provided.
    pub fn new(labels: impl IntoIterator<Item = Label>) -> Result<Self, QuizError> {
        let items: Vec<QuizItem> = labels
            .into_iter()
            .enumerate()
            .map(|(position, expected)| QuizItem {
                position,
                expected,
                is_correct: false,
                answer: None,
            })
            .collect();

        if items.is_empty() {
            return Err(QuizError::Empty);
        }

        Ok(Self { items })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn items(&self) -> &[QuizItem] {
        &self.items
    }

    #[must_use]
    pub fn get(&self, position: usize) -> Option<&QuizItem> {
        self.items.get(position)
    }

    /// Returns true if any item in the quiz expects this label.
    #[must_use]
    pub fn contains_label(&self, label: &str) -> bool {
        self.items.iter().any(|item| item.expected.as_str() == label)
    }

    /// Records a graded answer for the item at `position`.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::PositionOutOfRange` if the position does not exist.
    pub fn record(
        &mut self,
        position: usize,
        verdict: Verdict,
        is_correct: bool,
    ) -> Result<&QuizItem, QuizError> {
        let len = self.items.len();
        let item = self
            .items
            .get_mut(position)
            .ok_or(QuizError::PositionOutOfRange { position, len })?;
        item.answer = Some(verdict);
        item.is_correct = is_correct;
        Ok(item)
    }

    #[must_use]
    pub fn correct_count(&self) -> usize {
        self.items.iter().filter(|item| item.is_correct).count()
    }

    #[must_use]
    pub fn into_items(self) -> Vec<QuizItem> {
        self.items
    }
}
