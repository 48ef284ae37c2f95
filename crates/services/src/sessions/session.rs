use chrono::{DateTime, Utc};
use quiz_core::Clock;
use quiz_core::model::{
    Label, LandmarkFrame, LandmarkSnapshot, PredictionCandidate, Quiz, QuizItem, QuizSummary,
    RecognitionMode, SessionId, SessionState,
};
use quiz_core::scoring::{self, ScoringRule};
use tracing::{debug, info};

use super::progress::QuizProgress;
use super::view::SessionView;
use crate::error::SessionError;
use crate::recording::{EvaluationTicket, EvidenceBuffer, RecordingMachine, Resolution};

//
// ─── OUTCOMES ──────────────────────────────────────────────────────────────────
//

/// Evidence of one closed recording window, ready for a transport.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub ticket: EvaluationTicket,
    pub evidence: Vec<LandmarkSnapshot>,
}

/// What closing a recording window produced.
#[derive(Debug, Clone, PartialEq)]
pub enum StopOutcome {
    /// Submit this evidence; its result must carry the same ticket.
    Submit(Evaluation),
    /// Nothing was retained. The item stays in `Evaluating` with nothing in flight.
    NothingRetained,
    /// A discrete snapshot was abandoned before any frame was classified.
    Cancelled,
}

/// How the driver should use a sampled frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameUse {
    /// Render only.
    Skip,
    /// Extract landmarks and pass them to [`QuizSession::append`].
    Retain,
    /// Classify this frame once and resolve the result with the ticket.
    Classify(EvaluationTicket),
}

/// Result of moving forward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Progression {
    Moved { cursor: usize },
    Finished(QuizSummary),
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// One quiz attempt: the item list, the cursor and the recording lifecycle of
/// the current item.
///
/// The session performs no I/O. A driver feeds it commands, sampled frames and
/// evaluation results; every mutation of quiz items goes through
/// [`QuizSession::resolve`].
#[derive(Debug)]
pub struct QuizSession {
    id: SessionId,
    quiz: Quiz,
    cursor: usize,
    machine: RecordingMachine,
    buffer: EvidenceBuffer,
    scoring: ScoringRule,
    clock: Clock,
    started_at: DateTime<Utc>,
    summary: Option<QuizSummary>,
    camera_ready: bool,
    torn_down: bool,
}

impl QuizSession {
    /// Creates a session positioned on the first item.
    ///
    /// Discrete sessions score with [`ScoringRule::TopLetter`], sequence
    /// sessions with [`ScoringRule::BestListMatch`].
    #[must_use]
    pub fn new(quiz: Quiz, mode: RecognitionMode, clock: Clock) -> Self {
        let scoring = match mode {
            RecognitionMode::Discrete => ScoringRule::TopLetter,
            RecognitionMode::Sequence => ScoringRule::BestListMatch,
        };
        let id = SessionId::generate();
        info!(session = %id, ?mode, items = quiz.len(), "quiz session created");
        Self {
            id,
            quiz,
            cursor: 0,
            machine: RecordingMachine::new(mode),
            buffer: EvidenceBuffer::new(),
            scoring,
            started_at: clock.now(),
            clock,
            summary: None,
            camera_ready: false,
            torn_down: false,
        }
    }

    #[must_use]
    pub fn with_scoring(mut self, scoring: ScoringRule) -> Self {
        self.scoring = scoring;
        self
    }

    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    #[must_use]
    pub fn quiz(&self) -> &Quiz {
        &self.quiz
    }

    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    #[must_use]
    pub fn mode(&self) -> RecognitionMode {
        self.machine.mode()
    }

    #[must_use]
    pub fn scoring(&self) -> ScoringRule {
        self.scoring
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.machine.state()
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Summary of a finished quiz.
    #[must_use]
    pub fn summary(&self) -> Option<&QuizSummary> {
        self.summary.as_ref()
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.summary.is_some()
    }

    #[must_use]
    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Number of snapshots retained in the open recording window.
    #[must_use]
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    #[must_use]
    pub fn current_item(&self) -> Option<&QuizItem> {
        self.quiz.get(self.cursor)
    }

    #[must_use]
    pub fn current_expected(&self) -> Option<&Label> {
        self.current_item().map(QuizItem::expected)
    }

    pub fn set_camera_ready(&mut self, ready: bool) {
        self.camera_ready = ready;
    }

    #[must_use]
    pub fn progress(&self) -> QuizProgress {
        QuizProgress::from_items(self.quiz.items(), self.is_complete())
    }

    // ─── RECORDING ───────────────────────────────────────────────────────────

    /// Opens a recording window for the current item, discarding stale evidence.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::TornDown` or `SessionError::Completed` once the
    /// session is over, and `SessionError::InvalidTransition` while a window is
    /// open, an evaluation is in flight, or the item is already answered.
    pub fn start(&mut self) -> Result<(), SessionError> {
        self.ensure_active()?;
        self.machine.start()?;
        self.buffer.clear();
        Ok(())
    }

    /// Closes the recording window.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` unless currently recording.
    pub fn stop(&mut self) -> Result<StopOutcome, SessionError> {
        self.ensure_active()?;
        if self.mode() == RecognitionMode::Discrete {
            self.machine.cancel()?;
            return Ok(StopOutcome::Cancelled);
        }

        let ticket = self.machine.begin_evaluation()?;
        let evidence = self.buffer.drain();
        if evidence.is_empty() {
            self.machine.resolve(ticket, false);
            return Ok(StopOutcome::NothingRetained);
        }
        debug!(session = %self.id, %ticket, frames = evidence.len(), "recording window closed");
        Ok(StopOutcome::Submit(Evaluation { ticket, evidence }))
    }

    /// Decides what to do with a frame the sampler forwarded.
    ///
    /// In discrete mode the first frame after `start` is the only one judged.
    pub fn offer_frame(&mut self) -> FrameUse {
        if self.torn_down || self.is_complete() || self.state() != SessionState::Recording {
            return FrameUse::Skip;
        }
        match self.mode() {
            RecognitionMode::Sequence => FrameUse::Retain,
            RecognitionMode::Discrete => match self.machine.begin_evaluation() {
                Ok(ticket) => FrameUse::Classify(ticket),
                Err(_) => FrameUse::Skip,
            },
        }
    }

    /// Retains extracted landmarks while recording. Returns the stored snapshot
    /// so it can be pushed to a streaming transport.
    pub fn append(&mut self, landmarks: LandmarkFrame) -> Option<LandmarkSnapshot> {
        if self.torn_down || self.state() != SessionState::Recording {
            return None;
        }
        let captured_at_ms = self.clock.now_millis();
        Some(self.buffer.append(landmarks, captured_at_ms).clone())
    }

    /// Applies an evaluation result to the current item.
    ///
    /// Results for a ticket that is no longer pending (navigation, restart or
    /// teardown happened in between) are discarded. An empty candidate list in
    /// sequence mode leaves the item in `Evaluating`; in discrete mode it is
    /// judged as "no match".
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Quiz` if the cursor does not address an item.
    pub fn resolve(
        &mut self,
        ticket: EvaluationTicket,
        candidates: &[PredictionCandidate],
    ) -> Result<Resolution, SessionError> {
        if self.torn_down {
            debug!(session = %self.id, %ticket, "result arrived after teardown");
            return Ok(Resolution::Stale);
        }
        let judged = !candidates.is_empty() || self.mode() == RecognitionMode::Discrete;
        let resolution = self.machine.resolve(ticket, judged);
        if resolution != Resolution::Accepted {
            return Ok(resolution);
        }

        let score = scoring::score(self.scoring, candidates, &self.quiz, self.cursor)?;
        info!(
            session = %self.id,
            position = self.cursor,
            verdict = %score.verdict,
            correct = score.is_correct,
            "item answered"
        );
        self.quiz.record(self.cursor, score.verdict, score.is_correct)?;
        Ok(resolution)
    }

    /// The discrete guard timer elapsed.
    pub fn expire_indicator(&mut self) {
        self.machine.expire_indicator();
    }

    // ─── NAVIGATION ──────────────────────────────────────────────────────────

    /// Moves to the next item, or finishes the quiz from the last one.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotAnswered` until the current item has a verdict.
    pub fn next(&mut self) -> Result<Progression, SessionError> {
        self.ensure_active()?;
        if !self.current_item().is_some_and(QuizItem::is_answered) {
            return Err(SessionError::NotAnswered);
        }
        self.reset_item();

        if self.cursor + 1 >= self.quiz.len() {
            let summary = QuizSummary::from_items(self.started_at, self.clock.now(), self.quiz.items())?;
            info!(
                session = %self.id,
                total = summary.total(),
                correct = summary.correct(),
                "quiz finished"
            );
            self.summary = Some(summary.clone());
            return Ok(Progression::Finished(summary));
        }

        self.cursor += 1;
        Ok(Progression::Moved {
            cursor: self.cursor,
        })
    }

    /// Moves to the previous item, abandoning any in-progress attempt.
    /// Verdicts already recorded are kept.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::AtFirstItem` on the first item.
    pub fn prev(&mut self) -> Result<usize, SessionError> {
        self.ensure_active()?;
        if self.cursor == 0 {
            return Err(SessionError::AtFirstItem);
        }
        self.reset_item();
        self.cursor -= 1;
        Ok(self.cursor)
    }

    /// Ends the session. Any result arriving afterwards is stale. Idempotent.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.reset_item();
        self.camera_ready = false;
        self.torn_down = true;
        info!(session = %self.id, "quiz session torn down");
    }

    /// Presentation snapshot of the current item.
    #[must_use]
    pub fn view(&self) -> SessionView {
        let state = self.state();
        let item = self.current_item();
        let settled = !matches!(state, SessionState::Recording | SessionState::Evaluating);
        let answer = item.and_then(QuizItem::answer).filter(|_| settled).cloned();
        let is_correct = answer.as_ref().and(item.map(QuizItem::is_correct));

        SessionView {
            session_id: self.id,
            cursor: self.cursor,
            total: self.quiz.len(),
            expected: item.map(|i| i.expected().clone()),
            state,
            answer,
            is_correct,
            recording: self.machine.indicator(),
            can_prev: self.cursor > 0 && !self.torn_down,
            can_next: item.is_some_and(QuizItem::is_answered)
                && state != SessionState::Recording
                && !self.torn_down
                && !self.is_complete(),
            is_last: self.cursor + 1 == self.quiz.len(),
            camera_ready: self.camera_ready,
            completed: self.is_complete(),
        }
    }

    /// Consumes the session, returning the final quiz items.
    #[must_use]
    pub fn into_items(self) -> Vec<QuizItem> {
        self.quiz.into_items()
    }

    fn reset_item(&mut self) {
        self.machine.reset();
        self.buffer.clear();
    }

    fn ensure_active(&self) -> Result<(), SessionError> {
        if self.torn_down {
            return Err(SessionError::TornDown);
        }
        if self.is_complete() {
            return Err(SessionError::Completed);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::Verdict;
    use quiz_core::time::fixed_clock;

    fn quiz(labels: &[&str]) -> Quiz {
        Quiz::new(labels.iter().map(|s| Label::new(*s).unwrap())).unwrap()
    }

    fn candidate(label: &str, confidence: f64) -> PredictionCandidate {
        PredictionCandidate::new(label, confidence).unwrap()
    }

    fn sequence(labels: &[&str]) -> QuizSession {
        QuizSession::new(quiz(labels), RecognitionMode::Sequence, fixed_clock())
    }

    fn discrete(labels: &[&str]) -> QuizSession {
        QuizSession::new(quiz(labels), RecognitionMode::Discrete, fixed_clock())
    }

    fn record_window(session: &mut QuizSession, frames: usize) -> Evaluation {
        session.start().unwrap();
        for _ in 0..frames {
            assert_eq!(session.offer_frame(), FrameUse::Retain);
            session.append(LandmarkFrame::default()).unwrap();
        }
        match session.stop().unwrap() {
            StopOutcome::Submit(evaluation) => evaluation,
            other => panic!("expected evidence, got {other:?}"),
        }
    }

    #[test]
    fn sequence_answer_is_scored_against_current_item() {
        let mut session = sequence(&["A", "B"]);
        let evaluation = record_window(&mut session, 3);
        assert_eq!(evaluation.evidence.len(), 3);
        assert_eq!(session.state(), SessionState::Evaluating);
        assert_eq!(session.buffered(), 0);

        let candidates = [candidate("A", 0.4), candidate("B", 0.9), candidate("C", 0.95)];
        let resolution = session.resolve(evaluation.ticket, &candidates).unwrap();
        assert_eq!(resolution, Resolution::Accepted);

        let view = session.view();
        assert_eq!(view.state, SessionState::Answered);
        assert_eq!(view.answer, Some(Verdict::Matched(Label::new("B").unwrap())));
        assert_eq!(view.is_correct, Some(false));
        assert!(view.can_next);
    }

    #[test]
    fn empty_sequence_result_stalls_and_allows_rerecording() {
        let mut session = sequence(&["hello"]);
        let evaluation = record_window(&mut session, 2);

        let resolution = session.resolve(evaluation.ticket, &[]).unwrap();
        assert_eq!(resolution, Resolution::Stalled);
        assert_eq!(session.state(), SessionState::Evaluating);
        assert!(!session.view().can_next);

        let retry = record_window(&mut session, 1);
        session
            .resolve(retry.ticket, &[candidate("hello", 0.7)])
            .unwrap();
        assert_eq!(session.view().is_correct, Some(true));
    }

    #[test]
    fn stop_without_evidence_skips_the_transport() {
        let mut session = sequence(&["hello"]);
        session.start().unwrap();
        assert_eq!(session.stop().unwrap(), StopOutcome::NothingRetained);
        assert_eq!(session.state(), SessionState::Evaluating);
        session.start().unwrap();
    }

    #[test]
    fn start_is_refused_while_evaluation_is_in_flight() {
        let mut session = sequence(&["hello"]);
        let _pending = record_window(&mut session, 1);
        assert!(matches!(
            session.start(),
            Err(SessionError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn buffer_is_empty_when_idle_or_answered() {
        let mut session = sequence(&["A", "B"]);
        session.start().unwrap();
        session.offer_frame();
        session.append(LandmarkFrame::default());
        session.prev().unwrap_err();
        session.next().unwrap_err();

        let evaluation = session.stop().unwrap();
        let StopOutcome::Submit(evaluation) = evaluation else {
            panic!("expected evidence");
        };
        session.resolve(evaluation.ticket, &[candidate("A", 0.5)]).unwrap();
        assert_eq!(session.state(), SessionState::Answered);
        assert_eq!(session.buffered(), 0);

        session.next().unwrap();
        assert_eq!(session.state(), SessionState::Idle);
        assert_eq!(session.buffered(), 0);
        assert!(session.append(LandmarkFrame::default()).is_none());
    }

    #[test]
    fn discrete_snapshot_classifies_only_the_first_frame() {
        let mut session = discrete(&["A", "B"]);
        assert_eq!(session.offer_frame(), FrameUse::Skip);

        session.start().unwrap();
        let FrameUse::Classify(ticket) = session.offer_frame() else {
            panic!("first frame should be classified");
        };
        assert_eq!(session.offer_frame(), FrameUse::Skip);
        assert_eq!(session.offer_frame(), FrameUse::Skip);
        assert!(session.start().is_err());

        session.resolve(ticket, &[candidate("A", 0.8)]).unwrap();
        assert_eq!(session.view().is_correct, Some(true));
    }

    #[test]
    fn discrete_empty_result_is_no_match() {
        let mut session = discrete(&["A"]);
        session.start().unwrap();
        let FrameUse::Classify(ticket) = session.offer_frame() else {
            panic!("expected classification");
        };
        session.resolve(ticket, &[]).unwrap();

        let view = session.view();
        assert_eq!(view.state, SessionState::Answered);
        assert_eq!(view.answer, Some(Verdict::NoMatch));
        assert_eq!(view.is_correct, Some(false));
    }

    #[test]
    fn discrete_stop_before_a_frame_cancels() {
        let mut session = discrete(&["A"]);
        session.start().unwrap();
        assert_eq!(session.stop().unwrap(), StopOutcome::Cancelled);
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[test]
    fn discrete_indicator_is_cleared_by_the_guard() {
        let mut session = discrete(&["A"]);
        session.start().unwrap();
        let _ = session.offer_frame();
        assert!(session.view().recording);
        session.expire_indicator();
        assert!(!session.view().recording);
    }

    #[test]
    fn prev_keeps_recorded_verdicts_and_abandons_attempts() {
        let mut session = sequence(&["A", "B"]);
        let first = record_window(&mut session, 1);
        session.resolve(first.ticket, &[candidate("A", 0.9)]).unwrap();
        session.next().unwrap();

        let pending = record_window(&mut session, 1);
        assert_eq!(session.prev().unwrap(), 0);

        let view = session.view();
        assert_eq!(view.state, SessionState::Idle);
        assert_eq!(view.answer, Some(Verdict::Matched(Label::new("A").unwrap())));
        assert!(view.can_next);

        // The abandoned evaluation resolves late and must not touch item 0 or 1.
        let late = session.resolve(pending.ticket, &[candidate("B", 0.9)]).unwrap();
        assert_eq!(late, Resolution::Stale);
        assert!(!session.quiz().items()[1].is_answered());
        assert!(session.quiz().items()[0].is_correct());
    }

    #[test]
    fn next_requires_an_answer_and_prev_requires_a_predecessor() {
        let mut session = sequence(&["A", "B"]);
        assert!(matches!(session.next(), Err(SessionError::NotAnswered)));
        assert!(matches!(session.prev(), Err(SessionError::AtFirstItem)));
        assert!(!session.view().can_prev);
    }

    #[test]
    fn last_next_finishes_with_summary() {
        let mut session = sequence(&["A", "B"]);
        for label in ["A", "C"] {
            let evaluation = record_window(&mut session, 1);
            session
                .resolve(evaluation.ticket, &[candidate(label, 0.9), candidate("B", 0.1)])
                .unwrap();
            let progression = session.next().unwrap();
            if label == "C" {
                let Progression::Finished(summary) = progression else {
                    panic!("expected the quiz to finish");
                };
                assert_eq!(summary.total(), 2);
                assert_eq!(summary.correct(), 2);
            }
        }
        assert!(session.is_complete());
        assert!(matches!(session.start(), Err(SessionError::Completed)));
        assert_eq!(session.progress().correct, 2);
    }

    #[test]
    fn results_after_teardown_are_stale() {
        let mut session = sequence(&["A"]);
        let evaluation = record_window(&mut session, 2);
        session.teardown();
        session.teardown();

        let resolution = session
            .resolve(evaluation.ticket, &[candidate("A", 0.99)])
            .unwrap();
        assert_eq!(resolution, Resolution::Stale);
        assert!(!session.quiz().items()[0].is_answered());
        assert!(matches!(session.start(), Err(SessionError::TornDown)));
        assert_eq!(session.offer_frame(), FrameUse::Skip);
    }
}
