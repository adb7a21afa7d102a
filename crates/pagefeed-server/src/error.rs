//! Error types for the feed server.

use pagefeed::FeedError;

/// Errors that fail a request. Each one becomes the error envelope.
#[derive(thiserror::Error, Debug)]
pub enum ServerError {
    #[error("Invalid target URL '{target}': {reason}")]
    InvalidTarget { target: String, reason: String },

    #[error("Fetch failed: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("Extraction failed: {0}")]
    Extraction(String),

    #[error("Feed error: {0}")]
    Feed(#[from] FeedError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ServerError {
    pub fn invalid_target(target: &str, reason: impl std::fmt::Display) -> Self {
        Self::InvalidTarget {
            target: target.to_string(),
            reason: reason.to_string(),
        }
    }
}

pub type ServerResult<T> = Result<T, ServerError>;
