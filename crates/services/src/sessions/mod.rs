mod driver;
mod progress;
mod resources;
mod session;
mod view;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use driver::{Recognizer, SessionCommand, SessionDriver, SessionEvent};
pub use progress::QuizProgress;
pub use resources::{ResourceLease, ResourceSlot};
pub use session::{Evaluation, FrameUse, Progression, QuizSession, StopOutcome};
pub use view::SessionView;
