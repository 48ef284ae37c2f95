use serde::{Deserialize, Serialize};
use std::fmt;

/// Temporal lifecycle of the current quiz item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    /// Waiting for the user to start recording.
    #[default]
    Idle,
    /// Capturing evidence for one attempt.
    Recording,
    /// Evidence handed to a classifier; waiting for candidates.
    Evaluating,
    /// A verdict exists for the current item.
    Answered,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Idle => "idle",
            SessionState::Recording => "recording",
            SessionState::Evaluating => "evaluating",
            SessionState::Answered => "answered",
        };
        f.write_str(name)
    }
}

/// How gestures are recognized during a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecognitionMode {
    /// Single-frame snapshot classification (fingerspelling).
    Discrete,
    /// Buffered landmark sequence classified over a recording window (vocabulary).
    Sequence,
}
