use std::fmt;

use quiz_core::model::{RecognitionMode, SessionState};
use tracing::debug;

use crate::error::SessionError;

/// Identifies one evaluation request. Results carrying an older ticket are stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EvaluationTicket(u64);

impl fmt::Display for EvaluationTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What happened when an evaluation result was offered to the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// The ticket is not the one in flight (cancelled, superseded or torn down).
    Stale,
    /// Zero candidates: still evaluating, nothing is in flight any more.
    Stalled,
    /// Candidates accepted; the state is now `Answered`.
    Accepted,
}

/// Owns the `Idle -> Recording -> Evaluating -> Answered` lifecycle of the current item.
///
/// Exactly one state is active at a time and at most one evaluation is in
/// flight. The machine has no notion of quiz items; navigation calls `reset`.
#[derive(Debug)]
pub struct RecordingMachine {
    mode: RecognitionMode,
    state: SessionState,
    pending: Option<EvaluationTicket>,
    issued: u64,
    indicator: bool,
}

impl RecordingMachine {
    #[must_use]
    pub fn new(mode: RecognitionMode) -> Self {
        Self {
            mode,
            state: SessionState::Idle,
            pending: None,
            issued: 0,
            indicator: false,
        }
    }

    #[must_use]
    pub fn mode(&self) -> RecognitionMode {
        self.mode
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Whether the recording toggle should be shown as active.
    #[must_use]
    pub fn indicator(&self) -> bool {
        self.indicator
    }

    #[must_use]
    pub fn pending(&self) -> Option<EvaluationTicket> {
        self.pending
    }

    /// Opens a recording window.
    ///
    /// Allowed from `Idle`, and from `Evaluating` once the last evaluation came
    /// back empty (nothing in flight).
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` from any other state.
    pub fn start(&mut self) -> Result<(), SessionError> {
        let allowed = match self.state {
            SessionState::Idle => true,
            SessionState::Evaluating => self.pending.is_none(),
            SessionState::Recording | SessionState::Answered => false,
        };
        if !allowed {
            return Err(self.invalid("start recording"));
        }
        self.transition(SessionState::Recording);
        self.indicator = true;
        Ok(())
    }

    /// Closes the recording window and issues a ticket for the evaluation.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` unless currently recording.
    pub fn begin_evaluation(&mut self) -> Result<EvaluationTicket, SessionError> {
        if self.state != SessionState::Recording {
            return Err(self.invalid("evaluate"));
        }
        self.issued += 1;
        let ticket = EvaluationTicket(self.issued);
        self.pending = Some(ticket);
        if self.mode == RecognitionMode::Sequence {
            self.indicator = false;
        }
        self.transition(SessionState::Evaluating);
        Ok(ticket)
    }

    /// Abandons an open recording window without evaluating it.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` unless currently recording.
    pub fn cancel(&mut self) -> Result<(), SessionError> {
        if self.state != SessionState::Recording {
            return Err(self.invalid("cancel recording"));
        }
        self.indicator = false;
        self.transition(SessionState::Idle);
        Ok(())
    }

    /// Offers the outcome of the evaluation identified by `ticket`.
    pub fn resolve(&mut self, ticket: EvaluationTicket, has_candidates: bool) -> Resolution {
        if self.pending != Some(ticket) {
            debug!(%ticket, "discarding stale evaluation result");
            return Resolution::Stale;
        }
        self.pending = None;
        if !has_candidates {
            debug!(%ticket, "evaluation returned no candidates");
            return Resolution::Stalled;
        }
        self.transition(SessionState::Answered);
        Resolution::Accepted
    }

    /// Returns to a neutral `Idle` state, invalidating any evaluation in flight.
    pub fn reset(&mut self) {
        self.pending = None;
        self.indicator = false;
        self.transition(SessionState::Idle);
    }

    /// The discrete-mode guard timer fired: stop showing the toggle as active.
    pub fn expire_indicator(&mut self) {
        self.indicator = false;
    }

    fn transition(&mut self, to: SessionState) {
        if self.state != to {
            debug!(from = %self.state, %to, "recording state transition");
        }
        self.state = to;
    }

    fn invalid(&self, action: &'static str) -> SessionError {
        SessionError::InvalidTransition {
            state: self.state,
            action,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_lifecycle_runs_through_every_state() {
        let mut machine = RecordingMachine::new(RecognitionMode::Sequence);
        assert_eq!(machine.state(), SessionState::Idle);

        machine.start().unwrap();
        assert_eq!(machine.state(), SessionState::Recording);
        assert!(machine.indicator());

        let ticket = machine.begin_evaluation().unwrap();
        assert_eq!(machine.state(), SessionState::Evaluating);
        assert!(!machine.indicator());

        assert_eq!(machine.resolve(ticket, true), Resolution::Accepted);
        assert_eq!(machine.state(), SessionState::Answered);
    }

    #[test]
    fn start_is_refused_while_recording_answered_or_in_flight() {
        let mut machine = RecordingMachine::new(RecognitionMode::Sequence);
        machine.start().unwrap();
        assert!(matches!(
            machine.start(),
            Err(SessionError::InvalidTransition {
                state: SessionState::Recording,
                ..
            })
        ));

        let ticket = machine.begin_evaluation().unwrap();
        assert!(machine.start().is_err());

        machine.resolve(ticket, true);
        assert!(machine.start().is_err());
    }

    #[test]
    fn empty_result_stalls_in_evaluating_and_allows_rerecording() {
        let mut machine = RecordingMachine::new(RecognitionMode::Sequence);
        machine.start().unwrap();
        let ticket = machine.begin_evaluation().unwrap();

        assert_eq!(machine.resolve(ticket, false), Resolution::Stalled);
        assert_eq!(machine.state(), SessionState::Evaluating);
        assert_eq!(machine.pending(), None);

        machine.start().unwrap();
        assert_eq!(machine.state(), SessionState::Recording);
    }

    #[test]
    fn results_for_old_tickets_are_stale() {
        let mut machine = RecordingMachine::new(RecognitionMode::Sequence);
        machine.start().unwrap();
        let old = machine.begin_evaluation().unwrap();
        machine.reset();

        machine.start().unwrap();
        let current = machine.begin_evaluation().unwrap();
        assert_ne!(old, current);

        assert_eq!(machine.resolve(old, true), Resolution::Stale);
        assert_eq!(machine.state(), SessionState::Evaluating);
        assert_eq!(machine.resolve(current, true), Resolution::Accepted);
        assert_eq!(machine.resolve(current, true), Resolution::Stale);
    }

    #[test]
    fn discrete_indicator_stays_on_until_guard_expires() {
        let mut machine = RecordingMachine::new(RecognitionMode::Discrete);
        machine.start().unwrap();
        machine.begin_evaluation().unwrap();
        assert!(machine.indicator());

        machine.expire_indicator();
        assert!(!machine.indicator());
        assert_eq!(machine.state(), SessionState::Evaluating);
    }

    #[test]
    fn cancel_only_applies_to_open_windows() {
        let mut machine = RecordingMachine::new(RecognitionMode::Discrete);
        assert!(machine.cancel().is_err());
        machine.start().unwrap();
        machine.cancel().unwrap();
        assert_eq!(machine.state(), SessionState::Idle);
        assert!(!machine.indicator());
    }
}
