//! Shared session holder passed explicitly to the engine and the remote store.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use thiserror::Error;
use tracing::info;

use crate::model::User;

use super::session::Session;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("no active session")]
    Missing,
    #[error("session for {0} has expired")]
    Expired(String),
}

/// Cloneable handle to the current session, if any.
///
/// `begin` is called on login or registration, `end` on logout. Every clone
/// observes the same session.
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    current: Arc<RwLock<Option<Session>>>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Context that starts with an active session.
    pub fn with_session(session: Session) -> Self {
        let context = Self::new();
        context.begin(session);
        context
    }

    fn read(&self) -> RwLockReadGuard<'_, Option<Session>> {
        self.current.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Option<Session>> {
        self.current.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Install `session`, replacing any previous one.
    pub fn begin(&self, session: Session) {
        info!(user_id = %session.user_id(), "session started");
        *self.write() = Some(session);
    }

    /// Tear the session down. Returns the session that was active.
    pub fn end(&self) -> Option<Session> {
        let ended = self.write().take();
        if let Some(session) = &ended {
            info!(user_id = %session.user_id(), "session ended");
        }
        ended
    }

    pub fn current(&self) -> Option<Session> {
        self.read().clone()
    }

    pub fn is_active(&self) -> bool {
        self.read().is_some()
    }

    /// Bearer credential to attach to outgoing requests.
    pub fn token(&self) -> Option<String> {
        self.read().as_ref().map(|session| session.token().to_string())
    }

    pub fn user(&self) -> Option<User> {
        self.read().as_ref().map(|session| session.user().clone())
    }

    /// Identity of the acting user. Fails when no usable credential exists.
    pub fn actor(&self) -> Result<String, SessionError> {
        match self.read().as_ref() {
            None => Err(SessionError::Missing),
            Some(session) if session.is_expired() => {
                Err(SessionError::Expired(session.user_id().to_string()))
            }
            Some(session) => Ok(session.user_id().to_string()),
        }
    }

    /// Replace the session user after a confirmed profile change.
    /// Ignored when no session is active or the user differs.
    pub fn update_user(&self, user: User) -> bool {
        match self.write().as_mut() {
            Some(session) if session.user_id() == user.id => {
                session.set_user(user);
                true
            }
            _ => false,
        }
    }
}
