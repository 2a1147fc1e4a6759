//! Error taxonomy for retrieval and decoding.
//!
//! Retriable conditions (`TransientTransport`, `TransientServer`) are absorbed by the
//! client's retry loop; everything else reaches the caller unchanged.

use std::path::PathBuf;
use thiserror::Error;

/// Errors produced while fetching, caching, or decoding a dataset.
#[derive(Debug, Error)]
pub enum Error {
    /// Connection refused, timeout, DNS failure and the like.
    #[error("transport error: {0}")]
    TransientTransport(String),

    /// 5xx response.
    #[error("server error HTTP {status}: {body}")]
    TransientServer { status: u16, body: String },

    /// 4xx or any other non-2xx, non-5xx response.
    #[error("request failed with HTTP {status}: {body}")]
    PermanentClient { status: u16, body: String },

    /// The payload parsed but lacks the structure the format requires.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// The dimension metadata block is absent.
    #[error("missing metadata: {0}")]
    MissingMetadata(String),

    /// An observation key points past the end of a dimension.
    #[error("index {index} out of range for dimension {dimension} (size {size})")]
    IndexOutOfRange {
        dimension: String,
        index: usize,
        size: usize,
    },

    #[error("cache read failed for {path}: {reason}")]
    CacheRead { path: PathBuf, reason: String },

    #[error("cache write failed for {path}: {reason}")]
    CacheWrite { path: PathBuf, reason: String },

    /// `use_cache = Some(true)` on a client without a cache directory.
    #[error("caching requested but no cache directory is configured")]
    CacheNotConfigured,

    /// Final failure after the retry budget was spent.
    #[error("giving up after {attempts} attempt(s): {source}")]
    RetriesExhausted {
        attempts: u32,
        status: Option<u16>,
        #[source]
        source: Box<Error>,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    /// A table cannot be joined into a panel (missing key column, name clash).
    #[error("panel error: {0}")]
    Panel(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Longest response body excerpt carried inside an error.
const BODY_EXCERPT: usize = 200;

impl Error {
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedPayload(msg.into())
    }

    pub fn missing_metadata(msg: impl Into<String>) -> Self {
        Self::MissingMetadata(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Classify a non-2xx status into a transient or permanent HTTP error.
    pub fn from_status(status: u16, body: &str) -> Self {
        let body = excerpt(body);
        if (500..600).contains(&status) {
            Self::TransientServer { status, body }
        } else {
            Self::PermanentClient { status, body }
        }
    }

    /// Whether the retry loop should try again after this error.
    pub fn is_retriable(&self) -> bool {
        matches!(self, Self::TransientTransport(_) | Self::TransientServer { .. })
    }

    /// HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::TransientServer { status, .. } | Self::PermanentClient { status, .. } => {
                Some(*status)
            }
            Self::RetriesExhausted { status, .. } => *status,
            _ => None,
        }
    }
}

fn excerpt(body: &str) -> String {
    body.chars().take(BODY_EXCERPT).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_classification() {
        assert!(Error::from_status(503, "busy").is_retriable());
        assert!(!Error::from_status(404, "nope").is_retriable());
        assert!(!Error::from_status(302, "").is_retriable());
        assert_eq!(Error::from_status(404, "").status(), Some(404));
    }

    #[test]
    fn long_bodies_are_truncated() {
        let body = "x".repeat(1000);
        match Error::from_status(500, &body) {
            Error::TransientServer { body, .. } => assert_eq!(body.len(), BODY_EXCERPT),
            other => panic!("unexpected {other:?}"),
        }
    }
}
