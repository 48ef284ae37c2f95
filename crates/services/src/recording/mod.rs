//! Recording lifecycle and the evidence gathered during one recording window.

mod buffer;
mod machine;

pub use buffer::EvidenceBuffer;
pub use machine::{EvaluationTicket, RecordingMachine, Resolution};
