//! Read-only client for the vocabulary catalog and fingerspelling reference.

use std::collections::BTreeMap;

use quiz_core::model::{Label, SignId};
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

use crate::config::EngineConfig;
use crate::error::{ConfigError, ContentError};

// ─── TYPES ─────────────────────────────────────────────────────────────────────

/// One selectable vocabulary sign.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub id: SignId,
    pub sign: Label,
    /// Opaque reference to the demonstration video.
    pub media_ref: String,
}

/// Camera angle of a fingerspelling demonstration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceView {
    Front,
    Side,
}

/// Demonstration video for the fingerspelling alphabet, with per-letter start times.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FingerspellingReference {
    pub media_ref: String,
    front: BTreeMap<char, f64>,
    side: BTreeMap<char, f64>,
}

impl FingerspellingReference {
    /// Seconds into the demonstration where `letter` is shown from `view`.
    #[must_use]
    pub fn start_time(&self, view: ReferenceView, letter: char) -> Option<f64> {
        let table = match view {
            ReferenceView::Front => &self.front,
            ReferenceView::Side => &self.side,
        };
        table.get(&letter.to_ascii_uppercase()).copied()
    }
}

// ─── PAYLOADS ──────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(untagged)]
enum Payload<T> {
    Failure { error: String },
    Body(T),
}

#[derive(Deserialize)]
struct RawCatalogEntry {
    sign: String,
    #[serde(rename = "yt_embedId", default)]
    media_ref: String,
}

#[derive(Deserialize)]
struct RawReference {
    #[serde(rename = "yt_embedId", default)]
    media_ref: String,
    #[serde(default)]
    start_time: RawStartTimes,
}

#[derive(Deserialize, Default)]
struct RawStartTimes {
    #[serde(default)]
    front: BTreeMap<String, f64>,
    #[serde(default)]
    side: BTreeMap<String, f64>,
}

fn unwrap_payload<T: DeserializeOwned>(body: &str) -> Result<T, ContentError> {
    match serde_json::from_str::<Payload<T>>(body) {
        Ok(Payload::Body(body)) => Ok(body),
        Ok(Payload::Failure { error }) => Err(ContentError::Server(error)),
        // Re-parse as `T` directly to surface a useful decode error.
        Err(_) => Ok(serde_json::from_str::<T>(body)?),
    }
}

/// Parses the vocabulary catalog payload, sorted by id.
///
/// Entries with a non-numeric id or a blank sign are skipped.
///
/// # Errors
///
/// Returns `ContentError::Server` when the payload reports an error, or
/// `ContentError::Decode` when it is not a catalog.
pub fn parse_catalog(body: &str) -> Result<Vec<CatalogEntry>, ContentError> {
    let raw: BTreeMap<String, RawCatalogEntry> = unwrap_payload(body)?;
    let mut entries: Vec<CatalogEntry> = raw
        .into_iter()
        .filter_map(|(key, entry)| {
            let id = match key.parse::<SignId>() {
                Ok(id) => id,
                Err(e) => {
                    warn!("skipping catalog entry: {e}");
                    return None;
                }
            };
            let sign = Label::new(entry.sign)
                .inspect_err(|e| warn!(%id, "skipping catalog entry: {e}"))
                .ok()?;
            Some(CatalogEntry {
                id,
                sign,
                media_ref: entry.media_ref,
            })
        })
        .collect();
    entries.sort_by_key(|entry| entry.id);
    Ok(entries)
}

/// Parses the fingerspelling reference payload.
///
/// # Errors
///
/// Returns `ContentError::Server` when the payload reports an error, or
/// `ContentError::Decode` when it is malformed.
pub fn parse_reference(body: &str) -> Result<FingerspellingReference, ContentError> {
    let raw: RawReference = unwrap_payload(body)?;
    Ok(FingerspellingReference {
        media_ref: raw.media_ref,
        front: letter_table(raw.start_time.front),
        side: letter_table(raw.start_time.side),
    })
}

fn letter_table(raw: BTreeMap<String, f64>) -> BTreeMap<char, f64> {
    raw.into_iter()
        .filter_map(|(key, seconds)| {
            let mut chars = key.trim().chars();
            match (chars.next(), chars.next()) {
                (Some(letter), None) if letter.is_ascii_alphabetic() => {
                    Some((letter.to_ascii_uppercase(), seconds))
                }
                _ => None,
            }
        })
        .collect()
}

/// Keeps entries whose sign contains `query`, ignoring case.
/// A blank query keeps everything.
#[must_use]
pub fn filter_catalog<'a>(entries: &'a [CatalogEntry], query: &str) -> Vec<&'a CatalogEntry> {
    let needle = query.trim().to_lowercase();
    entries
        .iter()
        .filter(|entry| needle.is_empty() || entry.sign.as_str().to_lowercase().contains(&needle))
        .collect()
}

// ─── SERVICE ───────────────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
pub struct ContentService {
    client: Client,
    vocabulary_url: Url,
    fingerspelling_url: Url,
}

impl ContentService {
    /// Builds a client for the endpoints named in `config`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if an endpoint URL cannot be built.
    pub fn new(config: &EngineConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            client: Client::new(),
            vocabulary_url: config.endpoint(&config.vocab_contents_path)?,
            fingerspelling_url: config.endpoint(&config.fs_contents_path)?,
        })
    }

    /// Fetches the vocabulary catalog.
    ///
    /// # Errors
    ///
    /// Returns `ContentError` when the request fails or the payload is an error.
    pub async fn vocabulary(&self) -> Result<Vec<CatalogEntry>, ContentError> {
        let body = self.fetch(&self.vocabulary_url).await?;
        let entries = parse_catalog(&body)?;
        debug!(count = entries.len(), "loaded vocabulary catalog");
        Ok(entries)
    }

    /// Fetches the fingerspelling reference.
    ///
    /// # Errors
    ///
    /// Returns `ContentError` when the request fails or the payload is an error.
    pub async fn fingerspelling(&self) -> Result<FingerspellingReference, ContentError> {
        let body = self.fetch(&self.fingerspelling_url).await?;
        parse_reference(&body)
    }

    async fn fetch(&self, url: &Url) -> Result<String, ContentError> {
        let response = self.client.get(url.clone()).send().await?;
        if !response.status().is_success() {
            return Err(ContentError::HttpStatus(response.status()));
        }
        Ok(response.text().await?)
    }
}
