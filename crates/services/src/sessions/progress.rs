use quiz_core::model::QuizItem;

/// Aggregated view of quiz progress, useful for UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizProgress {
    pub total: usize,
    pub answered: usize,
    pub correct: usize,
    pub remaining: usize,
    pub is_complete: bool,
}

impl QuizProgress {
    #[must_use]
    pub fn from_items(items: &[QuizItem], is_complete: bool) -> Self {
        let answered = items.iter().filter(|item| item.is_answered()).count();
        let correct = items.iter().filter(|item| item.is_correct()).count();
        Self {
            total: items.len(),
            answered,
            correct,
            remaining: items.len() - answered,
            is_complete,
        }
    }
}
