use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::cache::CacheKey;
use crate::model::{Comment, ConnectionRequest, NewPost, Post, ProfileUpdate, Removal, User};

use super::error::SyncError;

/// A requested mutation against the backend.
///
/// The acting user is implicit: it comes from the session when the intent is
/// dispatched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    /// Flip the actor's like on a post shown in `collection`.
    ToggleLike { post_id: String, collection: CacheKey },
    CreateComment { post_id: String, content: String },
    CreatePost(NewPost),
    SendConnectionRequest { user_id: String },
    AcceptConnectionRequest { request_id: String },
    DeclineConnectionRequest { request_id: String },
    RemoveConnection { user_id: String },
    UpdateProfile(ProfileUpdate),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentKind {
    ToggleLike,
    CreateComment,
    CreatePost,
    SendConnectionRequest,
    AcceptConnectionRequest,
    DeclineConnectionRequest,
    RemoveConnection,
    UpdateProfile,
}

impl IntentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            IntentKind::ToggleLike => "toggle_like",
            IntentKind::CreateComment => "create_comment",
            IntentKind::CreatePost => "create_post",
            IntentKind::SendConnectionRequest => "send_connection_request",
            IntentKind::AcceptConnectionRequest => "accept_connection_request",
            IntentKind::DeclineConnectionRequest => "decline_connection_request",
            IntentKind::RemoveConnection => "remove_connection",
            IntentKind::UpdateProfile => "update_profile",
        }
    }
}

impl fmt::Display for IntentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Intent {
    /// Like toggle on a post in the main feed.
    pub fn like(post_id: impl Into<String>) -> Self {
        Intent::ToggleLike {
            post_id: post_id.into(),
            collection: CacheKey::Posts,
        }
    }

    pub fn comment(post_id: impl Into<String>, content: impl Into<String>) -> Self {
        Intent::CreateComment {
            post_id: post_id.into(),
            content: content.into(),
        }
    }

    pub fn post(content: impl Into<String>) -> Self {
        Intent::CreatePost(NewPost {
            content: content.into(),
            image: None,
        })
    }

    pub fn kind(&self) -> IntentKind {
        match self {
            Intent::ToggleLike { .. } => IntentKind::ToggleLike,
            Intent::CreateComment { .. } => IntentKind::CreateComment,
            Intent::CreatePost(_) => IntentKind::CreatePost,
            Intent::SendConnectionRequest { .. } => IntentKind::SendConnectionRequest,
            Intent::AcceptConnectionRequest { .. } => IntentKind::AcceptConnectionRequest,
            Intent::DeclineConnectionRequest { .. } => IntentKind::DeclineConnectionRequest,
            Intent::RemoveConnection { .. } => IntentKind::RemoveConnection,
            Intent::UpdateProfile(_) => IntentKind::UpdateProfile,
        }
    }

    /// Key of the entity this intent acts on. Creation intents target the
    /// collection they add to.
    pub fn target(&self) -> String {
        match self {
            Intent::ToggleLike { post_id, .. } | Intent::CreateComment { post_id, .. } => {
                format!("post/{}", post_id)
            }
            Intent::CreatePost(_) => "posts".to_string(),
            Intent::SendConnectionRequest { user_id } | Intent::RemoveConnection { user_id } => {
                format!("user/{}", user_id)
            }
            Intent::AcceptConnectionRequest { request_id }
            | Intent::DeclineConnectionRequest { request_id } => {
                format!("request/{}", request_id)
            }
            Intent::UpdateProfile(_) => "profile".to_string(),
        }
    }

    /// Reject intents the backend would refuse anyway, before any local effect.
    pub fn validate(&self) -> Result<(), SyncError> {
        let invalid = |reason: &str| Err(SyncError::InvalidIntent(reason.to_string()));
        match self {
            Intent::ToggleLike { post_id, collection } => {
                if post_id.is_empty() {
                    return invalid("post id is empty");
                }
                if !collection.holds_posts() {
                    return invalid("likes can only be projected onto post collections");
                }
            }
            Intent::CreateComment { post_id, content } => {
                if post_id.is_empty() {
                    return invalid("post id is empty");
                }
                if content.trim().is_empty() {
                    return invalid("comment is blank");
                }
            }
            Intent::CreatePost(post) => {
                if post.content.trim().is_empty() {
                    return invalid("post is blank");
                }
            }
            Intent::SendConnectionRequest { user_id } | Intent::RemoveConnection { user_id } => {
                if user_id.is_empty() {
                    return invalid("user id is empty");
                }
            }
            Intent::AcceptConnectionRequest { request_id }
            | Intent::DeclineConnectionRequest { request_id } => {
                if request_id.is_empty() {
                    return invalid("request id is empty");
                }
            }
            Intent::UpdateProfile(update) => {
                if update.is_empty() {
                    return invalid("profile update changes nothing");
                }
                if update.name.as_deref().is_some_and(|name| name.trim().is_empty()) {
                    return invalid("name is blank");
                }
            }
        }
        Ok(())
    }
}

/// The backend's answer to a confirmed intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Confirmation {
    Post(Post),
    Comment(Comment),
    Request(ConnectionRequest),
    User(User),
    Removed(Removal),
}

impl Confirmation {
    /// Decode the success body the backend returns for `kind`.
    pub fn decode(kind: IntentKind, body: Value) -> Result<Self, serde_json::Error> {
        Ok(match kind {
            IntentKind::ToggleLike | IntentKind::CreatePost => {
                Confirmation::Post(serde_json::from_value(body)?)
            }
            IntentKind::CreateComment => Confirmation::Comment(serde_json::from_value(body)?),
            IntentKind::SendConnectionRequest
            | IntentKind::AcceptConnectionRequest
            | IntentKind::DeclineConnectionRequest => {
                Confirmation::Request(serde_json::from_value(body)?)
            }
            IntentKind::RemoveConnection => Confirmation::Removed(serde_json::from_value(body)?),
            IntentKind::UpdateProfile => Confirmation::User(serde_json::from_value(body)?),
        })
    }
}
