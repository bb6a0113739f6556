//! Optimistic effects: the client-computable part of an apply-before intent.

use crate::cache::CacheValue;

use super::intent::Intent;

/// A directed, idempotent change to one cached collection.
///
/// Like toggles are resolved against the collection at issue time, so
/// applying an effect a second time (for example after a refetch) changes
/// nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    SetLike {
        post_id: String,
        user_id: String,
        liked: bool,
    },
    DropRequest {
        request_id: String,
    },
    DropConnection {
        user_id: String,
    },
}

impl Effect {
    /// Resolve the effect of `intent` by `actor` against `current`.
    ///
    /// `None` when the intent has no local projection or its target is not
    /// part of the collection.
    pub fn resolve(intent: &Intent, actor: &str, current: &CacheValue) -> Option<Effect> {
        match (intent, current) {
            (Intent::ToggleLike { post_id, .. }, CacheValue::Posts(posts)) => {
                let post = posts.iter().find(|post| &post.id == post_id)?;
                Some(Effect::SetLike {
                    post_id: post_id.clone(),
                    user_id: actor.to_string(),
                    liked: !post.is_liked_by(actor),
                })
            }
            (
                Intent::AcceptConnectionRequest { request_id }
                | Intent::DeclineConnectionRequest { request_id },
                CacheValue::Requests(requests),
            ) => requests
                .iter()
                .any(|request| &request.id == request_id)
                .then(|| Effect::DropRequest {
                    request_id: request_id.clone(),
                }),
            (Intent::RemoveConnection { user_id }, CacheValue::Users(users)) => users
                .iter()
                .any(|user| &user.id == user_id)
                .then(|| Effect::DropConnection {
                    user_id: user_id.clone(),
                }),
            _ => None,
        }
    }

    /// New collection with this effect applied. `value` is never modified;
    /// a value of another shape comes back unchanged.
    pub fn apply(&self, value: &CacheValue) -> CacheValue {
        match (self, value) {
            (
                Effect::SetLike {
                    post_id,
                    user_id,
                    liked,
                },
                CacheValue::Posts(posts),
            ) => CacheValue::Posts(
                posts
                    .iter()
                    .map(|post| {
                        let mut post = post.clone();
                        if &post.id == post_id {
                            post.set_liked(user_id, *liked);
                        }
                        post
                    })
                    .collect(),
            ),
            (Effect::DropRequest { request_id }, CacheValue::Requests(requests)) => {
                CacheValue::Requests(
                    requests
                        .iter()
                        .filter(|request| &request.id != request_id)
                        .cloned()
                        .collect(),
                )
            }
            (Effect::DropConnection { user_id }, CacheValue::Users(users)) => CacheValue::Users(
                users
                    .iter()
                    .filter(|user| &user.id != user_id)
                    .cloned()
                    .collect(),
            ),
            _ => value.clone(),
        }
    }
}
