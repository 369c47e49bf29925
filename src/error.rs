//! Error taxonomy
//!
//! One enum per failure concern. Branch boundaries in the pipeline and the
//! cycle orchestrator turn these into recorded outcomes instead of
//! propagating them.

use thiserror::Error;

/// A required credential is missing from the environment.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("required credential {name} is not set")]
    MissingCredential { name: &'static str },
}

/// Any third-party call failure.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("{service} request failed: {source}")]
    Transport {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{service} returned HTTP {status}: {body}")]
    Status {
        service: &'static str,
        status: u16,
        body: String,
    },

    #[error("{service} response could not be decoded: {reason}")]
    Decode {
        service: &'static str,
        reason: String,
    },

    #[error("no recognizable price data in response (shape: {shape})")]
    NoPriceData { shape: String },
}

impl UpstreamError {
    pub fn transport(service: &'static str, source: reqwest::Error) -> Self {
        Self::Transport { service, source }
    }

    pub fn decode(service: &'static str, reason: impl Into<String>) -> Self {
        Self::Decode {
            service,
            reason: reason.into(),
        }
    }
}

/// Malformed settings input.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("postFrequency must be between {min} and {max} minutes, got {value}")]
    FrequencyOutOfRange { value: i64, min: i64, max: i64 },

    #[error("invalid tone '{value}', expected one of casual, professional, witty, friendly, formal")]
    UnknownTone { value: String },

    #[error("invalid settings payload: {reason}")]
    Malformed { reason: String },
}

/// The generative oracle produced unusable output.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("generation returned empty text")]
    EmptyGeneration,

    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}

/// The social platform rejected or could not receive a post.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("post text is empty")]
    EmptyText,

    #[error("post text is {len} characters, limit is {max}")]
    TooLong { len: usize, max: usize },

    #[error("platform rejected the post (HTTP {status}): {body}")]
    Rejected { status: u16, body: String },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}

/// Single-slot document store failure.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("i/o error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error on {path}: {source}")]
    Serialization {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Settings write failure: either rejected input or a store failure.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Price refresh failure: fetch or persist.
#[derive(Debug, Error)]
pub enum PriceError {
    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
