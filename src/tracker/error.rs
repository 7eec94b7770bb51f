//! Errors raised by the tracker fetch adapter.

use thiserror::Error;

/// Failure of a single tracker API call.
#[derive(Debug, Error)]
pub enum TrackerError {
    /// The request never produced a response (DNS, connect, timeout).
    #[error("request to tracker failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The tracker answered with a non-success status.
    #[error("tracker API error {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body was not well-formed XML.
    #[error("malformed tracker response: {0}")]
    Xml(#[from] roxmltree::Error),

    /// The configured tracker URL cannot carry a path.
    #[error("invalid tracker base URL: {0}")]
    InvalidBaseUrl(String),

    /// A project id that cannot name a single path segment.
    #[error("invalid project id: {0:?}")]
    InvalidProject(String),
}

impl TrackerError {
    /// Short, key-free description shown in degraded-section notices.
    pub fn reason(&self) -> String {
        match self {
            TrackerError::Transport(e) if e.is_timeout() => "tracker request timed out".to_string(),
            TrackerError::Transport(e) if e.is_connect() => "cannot connect to tracker".to_string(),
            TrackerError::Transport(_) => "tracker request failed".to_string(),
            TrackerError::Status { status, .. } => format!("tracker returned HTTP {}", status),
            TrackerError::Xml(_) => "tracker returned malformed XML".to_string(),
            TrackerError::InvalidBaseUrl(_) => "tracker URL is misconfigured".to_string(),
            TrackerError::InvalidProject(_) => "invalid project id".to_string(),
        }
    }
}
