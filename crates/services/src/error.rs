//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::model::{LabelError, QuizError, QuizSummaryError, RecognitionMode, SessionState};

/// Errors emitted by camera, extractor and classifier collaborators.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CaptureError {
    #[error("camera unavailable: {0}")]
    CameraUnavailable(String),
    #[error("vision model unavailable: {0}")]
    ModelUnavailable(String),
    #[error("frame processing failed: {0}")]
    Processing(String),
}

/// Errors emitted by classification transports.
///
/// These never escape the engine: they are logged and treated as an empty
/// candidate list.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TransportError {
    #[error("prediction request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error(transparent)]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
    #[error("malformed prediction payload: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("streaming protocol error: {0}")]
    Protocol(String),
    #[error("streaming handshake timed out")]
    HandshakeTimeout,
    #[error("streaming channel is not connected")]
    NotConnected,
    #[error("streaming channel closed before a reply arrived")]
    ChannelClosed,
}

/// Errors emitted by `ContentService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ContentError {
    #[error("content request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("content service reported an error: {0}")]
    Server(String),
    #[error("malformed content payload: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Errors emitted while reading engine configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("{key} must be a positive integer, got {raw:?}")]
    InvalidNumber { key: &'static str, raw: String },
    #[error("{key} must be one of batch|stream, got {raw:?}")]
    InvalidTransport { key: &'static str, raw: String },
    #[error("invalid service address {raw:?}: {reason}")]
    InvalidUrl { raw: String, reason: String },
}

/// Errors emitted while building a quiz from a selection.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizBuildError {
    #[error("no words selected")]
    NoWordsSelected,
    #[error("at most {max} words can be selected")]
    SelectionFull { max: usize },
    #[error("quiz length must be > 0")]
    ZeroLength,
    #[error(transparent)]
    Label(#[from] LabelError),
    #[error(transparent)]
    Quiz(#[from] QuizError),
}

/// Errors emitted by the recognition session engine.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("camera or model could not be acquired")]
    Acquisition(#[source] CaptureError),
    #[error("camera and model are held by another session")]
    ResourceBusy,
    #[error("{recognizer:?} recognizer cannot drive a {session:?} session")]
    ModeMismatch {
        session: RecognitionMode,
        recognizer: RecognitionMode,
    },
    #[error("cannot {action} while {state}")]
    InvalidTransition {
        state: SessionState,
        action: &'static str,
    },
    #[error("current item has no answer yet")]
    NotAnswered,
    #[error("already at the first item")]
    AtFirstItem,
    #[error("session already completed")]
    Completed,
    #[error("session has been torn down")]
    TornDown,
    #[error(transparent)]
    Quiz(#[from] QuizError),
    #[error(transparent)]
    Summary(#[from] QuizSummaryError),
}
