use std::collections::BTreeSet;

use quiz_core::model::{Label, Quiz, SignId};
use rand::Rng;

use crate::content::CatalogEntry;
use crate::error::QuizBuildError;

/// Letters that can be fingerspelled from a single still frame (J and Z need motion).
pub const STATIC_LETTERS: &str = "ABCDEFGHILMNOPRSTUVWXY";

/// Draws `len` letters uniformly, with repetition, from [`STATIC_LETTERS`].
///
/// # Errors
///
/// Returns `QuizBuildError::ZeroLength` if `len` is zero.
pub fn letter_quiz(len: usize, rng: &mut impl Rng) -> Result<Quiz, QuizBuildError> {
    if len == 0 {
        return Err(QuizBuildError::ZeroLength);
    }
    let alphabet: Vec<char> = STATIC_LETTERS.chars().collect();
    let labels = (0..len)
        .map(|_| alphabet[rng.random_range(0..alphabet.len())])
        .map(|letter| Label::new(letter.to_string()))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Quiz::new(labels)?)
}

/// Builds a vocabulary quiz from the selected entries, in catalog order.
///
/// # Errors
///
/// Returns `QuizBuildError::NoWordsSelected` when nothing in `catalog` is selected.
pub fn vocabulary_quiz(
    catalog: &[CatalogEntry],
    selection: &WordSelection,
) -> Result<Quiz, QuizBuildError> {
    let labels: Vec<Label> = catalog
        .iter()
        .filter(|entry| selection.contains(entry.id))
        .map(|entry| entry.sign.clone())
        .collect();
    if labels.is_empty() {
        return Err(QuizBuildError::NoWordsSelected);
    }
    Ok(Quiz::new(labels)?)
}

/// The words a user picked for a vocabulary quiz, capped at `max`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordSelection {
    max: usize,
    selected: BTreeSet<SignId>,
}

impl WordSelection {
    #[must_use]
    pub fn new(max: usize) -> Self {
        Self {
            max,
            selected: BTreeSet::new(),
        }
    }

    #[must_use]
    pub fn max(&self) -> usize {
        self.max
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.selected.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        self.selected.len() >= self.max
    }

    #[must_use]
    pub fn contains(&self, id: SignId) -> bool {
        self.selected.contains(&id)
    }

    /// Selects `id`, or deselects it if already selected. Returns whether it is now selected.
    ///
    /// # Errors
    ///
    /// Returns `QuizBuildError::SelectionFull` when selecting beyond the cap;
    /// the selection is left unchanged.
    pub fn toggle(&mut self, id: SignId) -> Result<bool, QuizBuildError> {
        if self.selected.remove(&id) {
            return Ok(false);
        }
        if self.is_full() {
            return Err(QuizBuildError::SelectionFull { max: self.max });
        }
        self.selected.insert(id);
        Ok(true)
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }
}
