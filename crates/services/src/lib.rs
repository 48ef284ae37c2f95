#![forbid(unsafe_code)]

pub mod capture;
pub mod config;
pub mod content;
pub mod error;
pub mod quiz_builder;
pub mod recording;
pub mod sessions;
pub mod transport;

pub use quiz_core::Clock;

pub use config::{EngineConfig, TransportKind};
pub use content::{CatalogEntry, ContentService, FingerspellingReference, ReferenceView, filter_catalog};
pub use error::{
    CaptureError, ConfigError, ContentError, QuizBuildError, SessionError, TransportError,
};
pub use quiz_builder::{STATIC_LETTERS, WordSelection, letter_quiz, vocabulary_quiz};
pub use transport::{BatchTransport, ClassificationTransport, StreamingTransport};

pub use sessions::{
    QuizProgress, QuizSession, Recognizer, ResourceSlot, SessionCommand, SessionDriver,
    SessionEvent, SessionView,
};
