use quiz_core::model::{Label, SessionId, SessionState, Verdict};

/// Presentation-agnostic snapshot of a session.
///
/// No pre-formatted strings beyond [`SessionView::answer_text`]; the UI decides
/// how to render state and correctness.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionView {
    pub session_id: SessionId,
    pub cursor: usize,
    pub total: usize,
    pub expected: Option<Label>,
    pub state: SessionState,
    /// The recorded verdict of the current item, hidden while an attempt is in progress.
    pub answer: Option<Verdict>,
    pub is_correct: Option<bool>,
    /// Whether the recording toggle is shown as active.
    pub recording: bool,
    pub can_prev: bool,
    pub can_next: bool,
    pub is_last: bool,
    pub camera_ready: bool,
    pub completed: bool,
}

impl SessionView {
    /// One-based position, for "n / total" displays.
    #[must_use]
    pub fn position(&self) -> usize {
        self.cursor + 1
    }

    #[must_use]
    pub fn answer_text(&self) -> Option<&str> {
        self.answer.as_ref().map(Verdict::display_text)
    }
}
