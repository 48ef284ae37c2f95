mod candidate;
mod ids;
mod label;
mod landmark;
mod quiz;
mod state;
mod summary;

pub use candidate::{CandidateError, PredictionCandidate};
pub use ids::{ParseSignIdError, SessionId, SignId};
pub use label::{Label, LabelError, NO_MATCH_TEXT, Verdict, normalize_letter};
pub use landmark::{Landmark, LandmarkFrame, LandmarkSnapshot};
pub use quiz::{Quiz, QuizError, QuizItem};
pub use state::{RecognitionMode, SessionState};
pub use summary::{QuizSummary, QuizSummaryError};
