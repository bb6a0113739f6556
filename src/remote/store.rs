//! RemoteStore - the backend as seen by the engine.

use async_trait::async_trait;

use crate::cache::{CacheKey, CacheValue};
use crate::engine::{Confirmation, Intent};
use crate::model::{AuthRequest, AuthResponse};

use super::error::RemoteError;

/// Stateless request/response access to the backend.
///
/// Implementations attach the current credential themselves; the engine only
/// hands over what to read or which intent to perform.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Fetch the authoritative value stored under `key`.
    async fn fetch(&self, key: &CacheKey) -> Result<CacheValue, RemoteError>;

    /// Perform `intent` on behalf of the session user.
    async fn dispatch(&self, intent: &Intent) -> Result<Confirmation, RemoteError>;

    /// Exchange credentials for a session token.
    async fn authenticate(&self, request: &AuthRequest) -> Result<AuthResponse, RemoteError>;
}

#[async_trait]
impl<R: RemoteStore + ?Sized> RemoteStore for std::sync::Arc<R> {
    async fn fetch(&self, key: &CacheKey) -> Result<CacheValue, RemoteError> {
        (**self).fetch(key).await
    }

    async fn dispatch(&self, intent: &Intent) -> Result<Confirmation, RemoteError> {
        (**self).dispatch(intent).await
    }

    async fn authenticate(&self, request: &AuthRequest) -> Result<AuthResponse, RemoteError> {
        (**self).authenticate(request).await
    }
}
