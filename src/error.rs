//! Error types for Beacon chat

use thiserror::Error;

/// Result type alias for Beacon chat operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the Beacon chat client
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Host capability is not available (e.g. no speech recognition)
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// A turn is already in flight
    #[error("busy: a turn is already {0}")]
    Busy(&'static str),

    /// Speech recognition session error (host error code)
    #[error("recognition error: {0}")]
    Recognition(String),

    /// Speech synthesis error
    #[error("synthesis error: {0}")]
    Synthesis(String),

    /// Processing service answered with a non-success status
    #[error("exchange failed ({status}): {reason}")]
    Exchange {
        /// HTTP status code
        status: u16,
        /// Reason carried in the response body, or a generic fallback
        reason: String,
    },

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

}

impl Error {
    /// Human-readable reason suitable for the transcript
    ///
    /// Exchange failures surface only the server-provided reason.
    #[must_use]
    pub fn user_reason(&self) -> String {
        match self {
            Self::Exchange { reason, .. } => reason.clone(),
            Self::Http(e) if e.is_connect() => "could not reach the processing service".to_string(),
            other => other.to_string(),
        }
    }
}
