//! Classification transports: how evidence reaches the recognition service.

mod batch;
mod socketio;
mod stream;
mod wire;

use std::sync::Arc;

use async_trait::async_trait;
use quiz_core::model::{LandmarkSnapshot, PredictionCandidate};
use tracing::{debug, warn};

use crate::config::{EngineConfig, TransportKind};
use crate::error::{ConfigError, TransportError};

pub use batch::BatchTransport;
pub use stream::StreamingTransport;
pub use wire::{PredictionRecord, decode_candidates};

/// Contract shared by every transport strategy.
///
/// Zero candidates is a valid outcome ("no detectable gesture"), not an error.
#[async_trait]
pub trait ClassificationTransport: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Opens any persistent channel. Called once at session start.
    ///
    /// # Errors
    ///
    /// Returns `TransportError` if the channel cannot be opened.
    async fn connect(&self) -> Result<(), TransportError> {
        Ok(())
    }

    /// Offers one snapshot as soon as it is retained.
    ///
    /// # Errors
    ///
    /// Returns `TransportError` if an incremental push fails.
    async fn push(&self, _snapshot: &LandmarkSnapshot) -> Result<(), TransportError> {
        Ok(())
    }

    /// Requests candidates for the evidence of one recording window.
    ///
    /// # Errors
    ///
    /// Returns `TransportError` on network failure or a malformed payload.
    async fn submit(
        &self,
        evidence: Vec<LandmarkSnapshot>,
    ) -> Result<Vec<PredictionCandidate>, TransportError>;

    /// Closes any persistent channel. Called once at session teardown.
    async fn close(&self) {}
}

/// Submits evidence and folds every transport failure into "no candidates".
pub async fn classify(
    transport: &dyn ClassificationTransport,
    evidence: Vec<LandmarkSnapshot>,
) -> Vec<PredictionCandidate> {
    let frames = evidence.len();
    match transport.submit(evidence).await {
        Ok(candidates) => {
            debug!(transport = transport.name(), frames, candidates = candidates.len(), "classified");
            candidates
        }
        Err(err) => {
            warn!(transport = transport.name(), frames, "classification failed: {err}");
            Vec::new()
        }
    }
}

/// Builds the transport strategy selected by the configuration.
///
/// # Errors
///
/// Returns `ConfigError` if the endpoint URL cannot be built.
pub fn from_config(config: &EngineConfig) -> Result<Arc<dyn ClassificationTransport>, ConfigError> {
    let transport: Arc<dyn ClassificationTransport> = match config.transport {
        TransportKind::Batch => Arc::new(BatchTransport::new(config.endpoint(&config.predict_path)?)),
        TransportKind::Stream => Arc::new(StreamingTransport::new(config.stream_url()?)),
    };
    Ok(transport)
}
