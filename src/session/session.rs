use crate::model::User;

use super::token;

/// An authenticated session: the bearer credential and the user it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    token: String,
    user: User,
    expires_at: Option<u64>,
}

impl Session {
    pub fn new(token: impl Into<String>, user: User) -> Self {
        let token = token.into();
        let expires_at = token::expiry(&token);
        Self {
            token,
            user,
            expires_at,
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// `Authorization` header value for this session.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    pub fn user_id(&self) -> &str {
        &self.user.id
    }

    /// Seconds since the Unix epoch after which the credential is rejected.
    pub fn expires_at(&self) -> Option<u64> {
        self.expires_at
    }

    pub fn is_expired_at(&self, now_secs: u64) -> bool {
        self.expires_at.is_some_and(|exp| exp <= now_secs)
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(token::now_secs())
    }

    pub(crate) fn set_user(&mut self, user: User) {
        self.user = user;
    }
}
