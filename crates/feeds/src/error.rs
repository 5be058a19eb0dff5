//! Error types for offer fetching.

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while fetching P2P offers.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Upstream returned HTTP {0}")]
    HttpStatus(u16),

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Upstream error {code}: {message}")]
    Upstream { code: i64, message: String },

    #[error("No offers in response")]
    NoOffers,
}

impl From<reqwest::Error> for FeedError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FeedError::Timeout(err.to_string())
        } else if let Some(status) = err.status() {
            FeedError::HttpStatus(status.as_u16())
        } else if err.is_decode() {
            FeedError::Parse(err.to_string())
        } else {
            FeedError::Connection(err.to_string())
        }
    }
}

impl From<serde_json::Error> for FeedError {
    fn from(err: serde_json::Error) -> Self {
        FeedError::Parse(err.to_string())
    }
}

impl FeedError {
    /// Returns true if the next poll interval is likely to succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            FeedError::Connection(_) | FeedError::Timeout(_) | FeedError::NoOffers => true,
            FeedError::HttpStatus(code) => *code == 429 || *code >= 500,
            FeedError::Parse(_) | FeedError::Upstream { .. } => false,
        }
    }

    /// How long the upstream likely needs before answering again.
    /// Logged with transient failures; the bot itself never retries.
    pub fn suggested_retry_delay(&self) -> Option<Duration> {
        match self {
            FeedError::HttpStatus(429) => Some(Duration::from_secs(60)),
            FeedError::Connection(_) => Some(Duration::from_secs(5)),
            FeedError::Timeout(_) => Some(Duration::from_secs(2)),
            _ => None,
        }
    }
}
