use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Text shown in place of an answer when no candidate could be accepted.
pub const NO_MATCH_TEXT: &str = "No match found";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum LabelError {
    #[error("label cannot be empty")]
    Empty,
}

//
// ─── LABEL ─────────────────────────────────────────────────────────────────────
//

/// A sign or letter name, as used both for expected answers and recognized output.
///
/// Labels are trimmed on construction and compared exactly (case-sensitive),
/// matching the way the recognition service names its classes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Label(String);

impl Label {
    /// Creates a label from raw text.
    ///
    /// # Errors
    ///
    /// Returns `LabelError::Empty` if the text is blank.
    pub fn new(raw: impl Into<String>) -> Result<Self, LabelError> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(LabelError::Empty);
        }
        if trimmed.len() == raw.len() {
            Ok(Self(raw))
        } else {
            Ok(Self(trimmed.to_owned()))
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Label {
    type Error = LabelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Label> for String {
    fn from(value: Label) -> Self {
        value.0
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

//
// ─── VERDICT ───────────────────────────────────────────────────────────────────
//

/// The answer chosen for the current quiz item.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Verdict {
    /// A recognized label that passed domain filtering.
    Matched(Label),
    /// Nothing usable was recognized. Always graded as incorrect.
    NoMatch,
}

impl Verdict {
    #[must_use]
    pub fn label(&self) -> Option<&Label> {
        match self {
            Verdict::Matched(label) => Some(label),
            Verdict::NoMatch => None,
        }
    }

    #[must_use]
    pub fn is_no_match(&self) -> bool {
        matches!(self, Verdict::NoMatch)
    }

    /// Text to display as the user's answer.
    #[must_use]
    pub fn display_text(&self) -> &str {
        match self {
            Verdict::Matched(label) => label.as_str(),
            Verdict::NoMatch => NO_MATCH_TEXT,
        }
    }

    /// Strict comparison against the expected label. `NoMatch` never matches.
    #[must_use]
    pub fn matches(&self, expected: &Label) -> bool {
        self.label().is_some_and(|label| label == expected)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_text())
    }
}

/// Normalizes a fingerspelling category into a verdict.
///
/// Only a single ASCII uppercase letter is in the letter domain; missing or
/// other categories (e.g. "None", "space", lowercase) become `Verdict::NoMatch`.
#[must_use]
pub fn normalize_letter(category: Option<&str>) -> Verdict {
    let Some(raw) = category else {
        return Verdict::NoMatch;
    };
    let mut chars = raw.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_uppercase() => {
            Label::new(c.to_string()).map_or(Verdict::NoMatch, Verdict::Matched)
        }
        _ => Verdict::NoMatch,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_rejects_blank_and_trims() {
        assert_eq!(Label::new("   ").unwrap_err(), LabelError::Empty);
        assert_eq!(Label::new(" hello ").unwrap().as_str(), "hello");
    }

    #[test]
    fn label_deserializes_through_validation() {
        let label: Label = serde_json::from_str("\"cat\"").unwrap();
        assert_eq!(label.as_str(), "cat");
        assert!(serde_json::from_str::<Label>("\"\"").is_err());
    }

    #[test]
    fn no_match_never_matches_and_displays_sentinel() {
        let expected = Label::new("A").unwrap();
        assert!(!Verdict::NoMatch.matches(&expected));
        assert_eq!(Verdict::NoMatch.to_string(), NO_MATCH_TEXT);
        assert!(Verdict::Matched(expected.clone()).matches(&expected));
    }

    #[test]
    fn normalize_letter_keeps_only_single_uppercase_letters() {
        assert_eq!(
            normalize_letter(Some("B")),
            Verdict::Matched(Label::new("B").unwrap())
        );
        assert_eq!(normalize_letter(Some("b")), Verdict::NoMatch);
        assert_eq!(normalize_letter(Some("AB")), Verdict::NoMatch);
        assert_eq!(normalize_letter(Some("None")), Verdict::NoMatch);
        assert_eq!(normalize_letter(Some("")), Verdict::NoMatch);
        assert_eq!(normalize_letter(None), Verdict::NoMatch);
    }
}
