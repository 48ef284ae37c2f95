use std::env;
use std::time::Duration;

use url::Url;

use crate::error::ConfigError;

const DEFAULT_SERVER_ADDRESS: &str = "http://127.0.0.1:5000";

/// Which classification transport a session uses. Chosen once per session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    /// One POST request carrying the whole evidence buffer.
    Batch,
    /// Persistent Socket.IO channel with server-side accumulation.
    Stream,
}

impl TransportKind {
    /// Parses `batch` or `stream` (case-insensitive).
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "batch" | "rest" | "restapi" => Some(Self::Batch),
            "stream" | "socket" | "websocket" => Some(Self::Stream),
            _ => None,
        }
    }
}

/// Engine configuration, read once when a session is constructed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineConfig {
    pub server: Url,
    pub vocab_contents_path: String,
    pub fs_contents_path: String,
    pub predict_path: String,
    pub stream_path: String,
    pub transport: TransportKind,
    pub fs_quiz_length: usize,
    pub vocab_max_words: usize,
    pub target_sample_rate: u32,
    pub render_rate: u32,
    pub discrete_guard: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            server: Url::parse(DEFAULT_SERVER_ADDRESS).expect("default server address is valid"),
            vocab_contents_path: "/api/vocab-contents".into(),
            fs_contents_path: "/api/fs-contents".into(),
            predict_path: "/api/vocab-predict".into(),
            stream_path: "/socket.io/".into(),
            transport: TransportKind::Batch,
            fs_quiz_length: 10,
            vocab_max_words: 10,
            target_sample_rate: 15,
            render_rate: 60,
            discrete_guard: Duration::from_millis(100),
        }
    }
}

impl EngineConfig {
    /// Reads `SIGNQUIZ_*` environment variables, falling back to defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when a variable is set to an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`EngineConfig::from_env`] but reads values through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when a value is present but invalid.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let server = match get("SIGNQUIZ_SERVER_ADDRESS") {
            Some(raw) => parse_server(&raw)?,
            None => defaults.server,
        };
        let transport = match get("SIGNQUIZ_TRANSPORT") {
            Some(raw) => TransportKind::parse(&raw).ok_or(ConfigError::InvalidTransport {
                key: "SIGNQUIZ_TRANSPORT",
                raw,
            })?,
            None => defaults.transport,
        };
        let guard_ms = parse_positive(get("SIGNQUIZ_DISCRETE_GUARD_MS"), "SIGNQUIZ_DISCRETE_GUARD_MS", 100)?;

        Ok(Self {
            server,
            vocab_contents_path: get("SIGNQUIZ_VOCAB_CONTENTS_PATH")
                .unwrap_or(defaults.vocab_contents_path),
            fs_contents_path: get("SIGNQUIZ_FS_CONTENTS_PATH").unwrap_or(defaults.fs_contents_path),
            predict_path: get("SIGNQUIZ_VOCAB_PREDICT_PATH").unwrap_or(defaults.predict_path),
            stream_path: get("SIGNQUIZ_STREAM_PATH").unwrap_or(defaults.stream_path),
            transport,
            fs_quiz_length: parse_positive(
                get("SIGNQUIZ_FS_QUIZ_LENGTH"),
                "SIGNQUIZ_FS_QUIZ_LENGTH",
                defaults.fs_quiz_length as u64,
            )? as usize,
            vocab_max_words: parse_positive(
                get("SIGNQUIZ_VOCAB_MAX_WORDS"),
                "SIGNQUIZ_VOCAB_MAX_WORDS",
                defaults.vocab_max_words as u64,
            )? as usize,
            target_sample_rate: u32::try_from(parse_positive(
                get("SIGNQUIZ_TARGET_SAMPLE_RATE"),
                "SIGNQUIZ_TARGET_SAMPLE_RATE",
                u64::from(defaults.target_sample_rate),
            )?)
            .unwrap_or(u32::MAX),
            render_rate: u32::try_from(parse_positive(
                get("SIGNQUIZ_RENDER_RATE"),
                "SIGNQUIZ_RENDER_RATE",
                u64::from(defaults.render_rate),
            )?)
            .unwrap_or(u32::MAX),
            discrete_guard: Duration::from_millis(guard_ms),
        })
    }

    #[must_use]
    pub fn with_server(mut self, server: Url) -> Self {
        self.server = server;
        self
    }

    #[must_use]
    pub fn with_transport(mut self, transport: TransportKind) -> Self {
        self.transport = transport;
        self
    }

    /// Absolute URL of an HTTP endpoint below the configured server.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidUrl` if the path cannot be joined.
    pub fn endpoint(&self, path: &str) -> Result<Url, ConfigError> {
        self.server.join(path).map_err(|e| ConfigError::InvalidUrl {
            raw: format!("{}{}", self.server, path),
            reason: e.to_string(),
        })
    }

    /// Socket.IO WebSocket URL of the streaming channel (`http` becomes `ws`,
    /// `https` becomes `wss`).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidUrl` if the scheme cannot be converted.
    pub fn stream_url(&self) -> Result<Url, ConfigError> {
        let mut url = self.endpoint(&self.stream_path)?;
        let scheme = match url.scheme() {
            "https" | "wss" => "wss",
            _ => "ws",
        };
        url.set_scheme(scheme).map_err(|()| ConfigError::InvalidUrl {
            raw: url.to_string(),
            reason: format!("cannot use scheme {scheme}"),
        })?;
        url.query_pairs_mut()
            .append_pair("EIO", "4")
            .append_pair("transport", "websocket");
        Ok(url)
    }
}

fn parse_server(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim()).map_err(|e| ConfigError::InvalidUrl {
        raw: raw.to_string(),
        reason: e.to_string(),
    })?;
    if url.cannot_be_a_base() {
        return Err(ConfigError::InvalidUrl {
            raw: raw.to_string(),
            reason: "not a base URL".into(),
        });
    }
    Ok(url)
}

fn parse_positive(raw: Option<String>, key: &'static str, default: u64) -> Result<u64, ConfigError> {
    let Some(raw) = raw else {
        return Ok(default);
    };
    match raw.trim().parse::<u64>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(ConfigError::InvalidNumber { key, raw }),
    }
}
