//! Error types for talking to the backend.

use thiserror::Error;

/// Message used when a failed response carries none.
pub const DEFAULT_MESSAGE: &str = "An error occurred";

/// Why a request to the backend did not succeed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    /// Backend unreachable, or the request failed at the network layer.
    #[error("transport failure: {0}")]
    Transport(String),
    /// Credential missing, expired or refused (401/403).
    #[error("unauthorized ({status}): {message}")]
    Unauthorized { status: u16, message: String },
    /// Backend reachable but refused the request (validation, not found, ...).
    #[error("rejected ({status}): {message}")]
    Rejected { status: u16, message: String },
    /// Success response whose body does not have the expected shape.
    #[error("decode failed: {0}")]
    Decode(String),
}

impl RemoteError {
    /// Classify a non-success status and its message.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            401 | 403 => RemoteError::Unauthorized { status, message },
            _ => RemoteError::Rejected { status, message },
        }
    }

    /// HTTP-style status code, when the backend answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            RemoteError::Unauthorized { status, .. } | RemoteError::Rejected { status, .. } => {
                Some(*status)
            }
            RemoteError::Transport(_) | RemoteError::Decode(_) => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, RemoteError::Unauthorized { .. })
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, RemoteError::Transport(_))
    }
}

impl From<serde_json::Error> for RemoteError {
    fn from(err: serde_json::Error) -> Self {
        RemoteError::Decode(err.to_string())
    }
}
