use async_trait::async_trait;
use quiz_core::model::{LandmarkSnapshot, PredictionCandidate};
use reqwest::Client;
use url::Url;

use super::ClassificationTransport;
use super::wire::{BatchRequest, decode_candidates};
use crate::error::TransportError;

/// Sends the whole evidence buffer in one POST once recording stops.
#[derive(Clone, Debug)]
pub struct BatchTransport {
    client: Client,
    endpoint: Url,
}

impl BatchTransport {
    #[must_use]
    pub fn new(endpoint: Url) -> Self {
        Self::with_client(Client::new(), endpoint)
    }

    #[must_use]
    pub fn with_client(client: Client, endpoint: Url) -> Self {
        Self { client, endpoint }
    }

    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl ClassificationTransport for BatchTransport {
    fn name(&self) -> &'static str {
        "batch"
    }

    async fn submit(
        &self,
        evidence: Vec<LandmarkSnapshot>,
    ) -> Result<Vec<PredictionCandidate>, TransportError> {
        if evidence.is_empty() {
            return Ok(Vec::new());
        }

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&BatchRequest {
                all_landmarks: &evidence,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(TransportError::HttpStatus(response.status()));
        }

        let body = response.text().await?;
        Ok(decode_candidates(&body)?)
    }
}
