use thiserror::Error;

use crate::model::{CandidateError, LabelError, QuizError, QuizSummaryError};

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Label(#[from] LabelError),
    #[error(transparent)]
    Quiz(#[from] QuizError),
    #[error(transparent)]
    Candidate(#[from] CandidateError),
    #[error(transparent)]
    Summary(#[from] QuizSummaryError),
}
