use serde::{Deserialize, Serialize};

use crate::model::{Label, PredictionCandidate, Quiz, QuizError, Verdict, normalize_letter};

//
// ─── RULES ─────────────────────────────────────────────────────────────────────
//

/// How raw classifier candidates are reduced to a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringRule {
    /// Take the single most confident candidate and keep it only if it is a
    /// letter `A`-`Z`. Used for single-frame fingerspelling.
    TopLetter,
    /// Take the most confident candidate whose label is expected by *any*
    /// item of the quiz. Used for vocabulary sequences.
    BestListMatch,
}

/// Verdict for the current item plus its correctness.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    pub verdict: Verdict,
    pub is_correct: bool,
}

//
// ─── SCORING ───────────────────────────────────────────────────────────────────
//

/// Picks the highest-confidence candidate whose label is expected anywhere in the quiz.
///
/// Ties keep the candidate seen first. Candidates absent from the quiz are
/// ignored even when they are more confident.
///
/// # Examples
///
/// ```
/// # use quiz_core::model::{Label, PredictionCandidate, Quiz, Verdict};
/// # use quiz_core::scoring::best_list_match;
/// let quiz = Quiz::new(["A", "B"].map(|s| Label::new(s).unwrap()))?;
/// let candidates = vec![
///     PredictionCandidate::new("A", 0.4)?,
///     PredictionCandidate::new("B", 0.9)?,
///     PredictionCandidate::new("C", 0.95)?,
/// ];
/// assert_eq!(best_list_match(&candidates, &quiz), Verdict::Matched(Label::new("B")?));
/// # Ok::<(), quiz_core::Error>(())
/// ```
#[must_use]
pub fn best_list_match(candidates: &[PredictionCandidate], quiz: &Quiz) -> Verdict {
    let mut best: Option<&PredictionCandidate> = None;
    for candidate in candidates {
        if !quiz.contains_label(candidate.label()) {
            continue;
        }
        if best.is_none_or(|b| candidate.confidence() > b.confidence()) {
            best = Some(candidate);
        }
    }

    best.and_then(|candidate| Label::new(candidate.label()).ok())
        .map_or(Verdict::NoMatch, Verdict::Matched)
}

/// Picks the most confident candidate and normalizes it into the letter domain.
#[must_use]
pub fn top_letter(candidates: &[PredictionCandidate]) -> Verdict {
    let mut top: Option<&PredictionCandidate> = None;
    for candidate in candidates {
        if top.is_none_or(|t| candidate.confidence() > t.confidence()) {
            top = Some(candidate);
        }
    }
    normalize_letter(top.map(PredictionCandidate::label))
}

/// Reduces candidates with `rule` and grades the verdict against the item at `position`.
///
/// The search for a verdict may accept a label belonging to a different item,
/// but correctness is always judged against the current item only. Calling this
/// twice with the same inputs yields the same score.
///
/// # Errors
///
/// Returns `QuizError::PositionOutOfRange` if `position` is not a quiz item.
pub fn score(
    rule: ScoringRule,
    candidates: &[PredictionCandidate],
    quiz: &Quiz,
    position: usize,
) -> Result<Score, QuizError> {
    let item = quiz.get(position).ok_or(QuizError::PositionOutOfRange {
        position,
        len: quiz.len(),
    })?;

    let verdict = match rule {
        ScoringRule::TopLetter => top_letter(candidates),
        ScoringRule::BestListMatch => best_list_match(candidates, quiz),
    };
    let is_correct = grade(&verdict, item.expected());

    Ok(Score {
        verdict,
        is_correct,
    })
}

/// Strict comparison of a verdict with the expected label.
#[must_use]
pub fn grade(verdict: &Verdict, expected: &Label) -> bool {
    verdict.matches(expected)
}
