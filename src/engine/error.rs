//! Error types surfaced by the synchronization engine.

use thiserror::Error;

use crate::cache::CacheKey;
use crate::remote::RemoteError;
use crate::session::SessionError;

use super::inflight::IntentId;
use super::intent::IntentKind;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    /// No usable credential. The view layer sends the user to log in.
    #[error("not authenticated: {0}")]
    Unauthenticated(#[from] SessionError),
    /// Rejected locally before any effect or request.
    #[error("invalid intent: {0}")]
    InvalidIntent(String),
    /// The backend did not confirm the intent; its local effect was reverted.
    #[error("{kind} intent {id} failed: {source}")]
    IntentFailed {
        id: IntentId,
        kind: IntentKind,
        #[source]
        source: RemoteError,
    },
    #[error("fetching {key} failed: {source}")]
    FetchFailed {
        key: CacheKey,
        #[source]
        source: RemoteError,
    },
    /// The session ended or changed hands before the work could settle. Its
    /// result was discarded.
    #[error("session changed before the request settled")]
    SessionChanged,
    /// The value cached under the key is not of the requested type.
    #[error("cached value for {0} has an unexpected shape")]
    ShapeMismatch(CacheKey),
    #[error(transparent)]
    Remote(#[from] RemoteError),
}

impl SyncError {
    /// The remote cause, when the failure came from the backend.
    pub fn remote(&self) -> Option<&RemoteError> {
        match self {
            SyncError::IntentFailed { source, .. } | SyncError::FetchFailed { source, .. } => {
                Some(source)
            }
            SyncError::Remote(source) => Some(source),
            _ => None,
        }
    }

    /// Whether the user has to (re-)authenticate.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, SyncError::Unauthenticated(_))
            || self.remote().is_some_and(RemoteError::is_unauthorized)
    }
}
