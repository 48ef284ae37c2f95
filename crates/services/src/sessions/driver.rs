use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use quiz_core::model::{PredictionCandidate, QuizSummary, RecognitionMode};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::task::JoinSet;
use tokio::time::{self, Instant, Sleep};
use tracing::{debug, info, warn};

use super::resources::ResourceSlot;
use super::session::{Evaluation, FrameUse, Progression, QuizSession, StopOutcome};
use super::view::SessionView;
use crate::capture::{
    CameraSource, Frame, FrameRenderer, FrameSampler, GestureClassifier, LandmarkExtractor,
    NullRenderer, categories_to_candidates,
};
use crate::config::EngineConfig;
use crate::error::SessionError;
use crate::recording::{EvaluationTicket, Resolution};
use crate::transport::{ClassificationTransport, classify};

/// Consecutive frames handled before a pending command is checked for.
const FRAME_BURST: usize = 8;

/// User input forwarded to a running session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCommand {
    Start,
    Stop,
    Next,
    Prev,
    Teardown,
}

/// Notifications emitted by a running session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Camera or model could not be acquired. The session will not sample frames.
    NotReady { reason: String },
    Updated(SessionView),
    Rejected {
        command: SessionCommand,
        reason: String,
    },
    Finished(QuizSummary),
}

/// The vision collaborators of one session, chosen by recognition mode.
pub enum Recognizer {
    Discrete(Box<dyn GestureClassifier>),
    Sequence {
        extractor: Box<dyn LandmarkExtractor>,
        transport: Arc<dyn ClassificationTransport>,
    },
}

impl Recognizer {
    #[must_use]
    pub fn mode(&self) -> RecognitionMode {
        match self {
            Recognizer::Discrete(_) => RecognitionMode::Discrete,
            Recognizer::Sequence { .. } => RecognitionMode::Sequence,
        }
    }

    async fn close(&mut self) {
        match self {
            Recognizer::Discrete(classifier) => classifier.close().await,
            Recognizer::Sequence { extractor, .. } => extractor.close().await,
        }
    }
}

enum Flow {
    Continue,
    ArmGuard,
    Finished(QuizSummary),
    Teardown,
}

/// Drives a [`QuizSession`] from camera frames, user commands and transport
/// results on a single task.
///
/// Frame extraction and local classification are awaited inline; transport
/// submissions run as separate tasks whose results come back tagged with
/// their evaluation ticket.
pub struct SessionDriver {
    session: QuizSession,
    recognizer: Recognizer,
    camera: Box<dyn CameraSource>,
    renderer: Box<dyn FrameRenderer>,
    sampler: FrameSampler,
    guard: Duration,
    slot: ResourceSlot,
}

impl SessionDriver {
    /// # Errors
    ///
    /// Returns `SessionError::ModeMismatch` if the recognizer does not fit the session mode.
    pub fn new(
        session: QuizSession,
        recognizer: Recognizer,
        camera: Box<dyn CameraSource>,
        slot: ResourceSlot,
        config: &EngineConfig,
    ) -> Result<Self, SessionError> {
        if session.mode() != recognizer.mode() {
            return Err(SessionError::ModeMismatch {
                session: session.mode(),
                recognizer: recognizer.mode(),
            });
        }
        Ok(Self {
            session,
            recognizer,
            camera,
            renderer: Box::new(NullRenderer),
            sampler: FrameSampler::new(config.render_rate, config.target_sample_rate),
            guard: config.discrete_guard,
            slot,
        })
    }

    #[must_use]
    pub fn with_renderer(mut self, renderer: Box<dyn FrameRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    #[must_use]
    pub fn session(&self) -> &QuizSession {
        &self.session
    }

    /// Runs the session until it finishes, is torn down, or the command
    /// channel closes. Resources are released in order before returning:
    /// streaming channel, camera, model, then the slot.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::ResourceBusy` or `SessionError::Acquisition` if the
    /// session could not start; a `NotReady` event is emitted first.
    pub async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<SessionCommand>,
        events: mpsc::UnboundedSender<SessionEvent>,
    ) -> Result<QuizSession, SessionError> {
        let session_id = self.session.id();
        let lease = match self.slot.try_acquire() {
            Ok(lease) => lease,
            Err(err) => {
                warn!(session = %session_id, "{err}");
                let _ = events.send(SessionEvent::NotReady {
                    reason: err.to_string(),
                });
                self.session.teardown();
                self.recognizer.close().await;
                return Err(err);
            }
        };

        if let Err(err) = self.camera.acquire().await {
            warn!(session = %session_id, "camera unavailable: {err}");
            let _ = events.send(SessionEvent::NotReady {
                reason: err.to_string(),
            });
            self.session.teardown();
            self.recognizer.close().await;
            drop(lease);
            return Err(SessionError::Acquisition(err));
        }

        if let Recognizer::Sequence { transport, .. } = &self.recognizer {
            if let Err(err) = transport.connect().await {
                warn!(session = %session_id, transport = transport.name(), "connect failed: {err}");
            }
        }
        self.session.set_camera_ready(true);
        info!(session = %session_id, mode = ?self.session.mode(), "session running");
        self.publish(&events);

        let mut in_flight: JoinSet<(EvaluationTicket, Vec<PredictionCandidate>)> = JoinSet::new();
        let guard = time::sleep(Duration::ZERO);
        tokio::pin!(guard);
        let mut guard_armed = false;
        let mut camera_live = true;

        // Ready frames are handled before commands so a command sees every
        // frame captured before it. A run of FRAME_BURST frames yields and
        // checks for a pending command, so a backlogged camera cannot starve input.
        let mut burst = 0usize;
        loop {
            if burst >= FRAME_BURST {
                burst = 0;
                tokio::task::yield_now().await;
                let pending = match commands.try_recv() {
                    Ok(command) => Some(command),
                    Err(TryRecvError::Empty) => None,
                    Err(TryRecvError::Disconnected) => Some(SessionCommand::Teardown),
                };
                if let Some(command) = pending {
                    if self.dispatch(command, &mut in_flight, guard.as_mut(), &mut guard_armed, &events) {
                        break;
                    }
                    continue;
                }
            }

            tokio::select! {
                biased;

                Some(joined) = in_flight.join_next() => {
                    match joined {
                        Ok((ticket, candidates)) => self.apply(ticket, &candidates),
                        Err(err) => warn!(session = %session_id, "evaluation task failed: {err}"),
                    }
                    self.publish(&events);
                }
                () = &mut guard, if guard_armed => {
                    guard_armed = false;
                    self.session.expire_indicator();
                    self.publish(&events);
                }
                frame = self.camera.next_frame(), if camera_live => match frame {
                    Some(frame) => {
                        burst += 1;
                        if self.on_frame(frame).await {
                            self.publish(&events);
                        }
                    }
                    None => {
                        warn!(session = %session_id, "camera stream ended");
                        camera_live = false;
                    }
                },
                command = commands.recv() => {
                    burst = 0;
                    let command = command.unwrap_or(SessionCommand::Teardown);
                    if self.dispatch(command, &mut in_flight, guard.as_mut(), &mut guard_armed, &events) {
                        break;
                    }
                }
            }
        }

        in_flight.abort_all();
        self.session.teardown();
        if let Recognizer::Sequence { transport, .. } = &self.recognizer {
            transport.close().await;
        }
        self.camera.release();
        self.recognizer.close().await;
        drop(lease);
        self.publish(&events);
        Ok(self.session)
    }

    /// Applies one command and publishes the result. Returns true when the
    /// loop should exit.
    fn dispatch(
        &mut self,
        command: SessionCommand,
        in_flight: &mut JoinSet<(EvaluationTicket, Vec<PredictionCandidate>)>,
        guard: Pin<&mut Sleep>,
        guard_armed: &mut bool,
        events: &mpsc::UnboundedSender<SessionEvent>,
    ) -> bool {
        match self.on_command(command, in_flight) {
            Ok(Flow::Continue) => {}
            Ok(Flow::ArmGuard) => {
                guard.reset(Instant::now() + self.guard);
                *guard_armed = true;
            }
            Ok(Flow::Finished(summary)) => {
                self.publish(events);
                let _ = events.send(SessionEvent::Finished(summary));
                return true;
            }
            Ok(Flow::Teardown) => return true,
            Err(err) => {
                debug!(session = %self.session.id(), ?command, "command rejected: {err}");
                let _ = events.send(SessionEvent::Rejected {
                    command,
                    reason: err.to_string(),
                });
            }
        }
        self.publish(events);
        false
    }

    fn on_command(
        &mut self,
        command: SessionCommand,
        in_flight: &mut JoinSet<(EvaluationTicket, Vec<PredictionCandidate>)>,
    ) -> Result<Flow, SessionError> {
        match command {
            SessionCommand::Start => {
                self.session.start()?;
                Ok(match self.session.mode() {
                    RecognitionMode::Discrete => Flow::ArmGuard,
                    RecognitionMode::Sequence => Flow::Continue,
                })
            }
            SessionCommand::Stop => {
                match self.session.stop()? {
                    StopOutcome::Submit(evaluation) => self.submit(evaluation, in_flight),
                    StopOutcome::NothingRetained => {
                        debug!(session = %self.session.id(), "nothing retained; not submitting");
                    }
                    StopOutcome::Cancelled => {}
                }
                Ok(Flow::Continue)
            }
            SessionCommand::Next => match self.session.next()? {
                Progression::Moved { .. } => Ok(Flow::Continue),
                Progression::Finished(summary) => Ok(Flow::Finished(summary)),
            },
            SessionCommand::Prev => {
                self.session.prev()?;
                Ok(Flow::Continue)
            }
            SessionCommand::Teardown => Ok(Flow::Teardown),
        }
    }

    fn submit(
        &self,
        evaluation: Evaluation,
        in_flight: &mut JoinSet<(EvaluationTicket, Vec<PredictionCandidate>)>,
    ) {
        let Recognizer::Sequence { transport, .. } = &self.recognizer else {
            return;
        };
        let transport = Arc::clone(transport);
        let Evaluation { ticket, evidence } = evaluation;
        in_flight.spawn(async move {
            let candidates = classify(transport.as_ref(), evidence).await;
            (ticket, candidates)
        });
    }

    /// Renders every frame and extracts or classifies the sampled ones.
    /// Returns true if the view changed.
    async fn on_frame(&mut self, frame: Frame) -> bool {
        if !self.renderer.is_headless() {
            self.renderer.render(&frame.mirrored());
        }
        if !self.sampler.on_render() {
            return false;
        }

        match self.session.offer_frame() {
            FrameUse::Skip => false,
            FrameUse::Retain => {
                let Recognizer::Sequence {
                    extractor,
                    transport,
                } = &mut self.recognizer
                else {
                    return false;
                };
                let landmarks = match extractor.extract(&frame).await {
                    Ok(landmarks) => landmarks,
                    Err(err) => {
                        warn!(session = %self.session.id(), "landmark extraction failed: {err}");
                        return false;
                    }
                };
                self.renderer.overlay(&landmarks);
                if let Some(snapshot) = self.session.append(landmarks) {
                    if let Err(err) = transport.push(&snapshot).await {
                        warn!(session = %self.session.id(), "snapshot push failed: {err}");
                    }
                }
                false
            }
            FrameUse::Classify(ticket) => {
                let Recognizer::Discrete(classifier) = &mut self.recognizer else {
                    return false;
                };
                let candidates = match classifier.classify(&frame, frame.timestamp_ms()).await {
                    Ok(categories) => categories_to_candidates(categories),
                    Err(err) => {
                        warn!(session = %self.session.id(), "classification failed: {err}");
                        Vec::new()
                    }
                };
                self.apply(ticket, &candidates);
                true
            }
        }
    }

    fn apply(&mut self, ticket: EvaluationTicket, candidates: &[PredictionCandidate]) {
        match self.session.resolve(ticket, candidates) {
            Ok(Resolution::Stale) => debug!(%ticket, "stale evaluation discarded"),
            Ok(_) => {}
            Err(err) => warn!(session = %self.session.id(), %ticket, "could not apply evaluation: {err}"),
        }
    }

    fn publish(&self, events: &mpsc::UnboundedSender<SessionEvent>) {
        let _ = events.send(SessionEvent::Updated(self.session.view()));
    }
}
