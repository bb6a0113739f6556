//! Per-kind reconciliation policy.
//!
//! | kind                       | strategy        | projected onto       |
//! |----------------------------|-----------------|----------------------|
//! | toggle_like                | apply-before    | the post collection  |
//! | create_comment             | reconcile-after |                      |
//! | create_post                | reconcile-after |                      |
//! | send_connection_request    | reconcile-after |                      |
//! | accept_connection_request  | apply-before    | connectionRequests   |
//! | decline_connection_request | apply-before    | connectionRequests   |
//! | remove_connection          | apply-before    | connections          |
//! | update_profile             | reconcile-after |                      |
//!
//! Reconcile-after is used wherever the backend generates identity, order or
//! timestamps.

use serde::{Deserialize, Serialize};

use crate::cache::CacheKey;

use super::intent::{Intent, IntentKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reconciliation {
    /// Project the effect locally before the backend confirms it.
    ApplyBefore,
    /// Wait for confirmation, then refetch.
    ReconcileAfter,
}

impl IntentKind {
    pub fn reconciliation(self) -> Reconciliation {
        match self {
            IntentKind::ToggleLike
            | IntentKind::AcceptConnectionRequest
            | IntentKind::DeclineConnectionRequest
            | IntentKind::RemoveConnection => Reconciliation::ApplyBefore,
            IntentKind::CreateComment
            | IntentKind::CreatePost
            | IntentKind::SendConnectionRequest
            | IntentKind::UpdateProfile => Reconciliation::ReconcileAfter,
        }
    }
}

/// What the engine does with the cache for one intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Policy {
    pub reconciliation: Reconciliation,
    /// Collection the optimistic effect is projected onto (apply-before only).
    pub projects_onto: Option<CacheKey>,
    /// Keys invalidated once the backend confirms.
    pub invalidates: Vec<CacheKey>,
}

impl Policy {
    pub fn for_intent(intent: &Intent, actor: &str) -> Self {
        let reconciliation = intent.kind().reconciliation();
        let (projects_onto, invalidates) = match intent {
            Intent::ToggleLike { collection, .. } => {
                let mut invalidates = vec![collection.clone()];
                if *collection != CacheKey::Posts {
                    invalidates.push(CacheKey::Posts);
                }
                (Some(collection.clone()), invalidates)
            }
            Intent::CreateComment { .. } => (None, vec![CacheKey::Posts]),
            Intent::CreatePost(_) => (
                None,
                vec![CacheKey::Posts, CacheKey::UserPosts(actor.to_string())],
            ),
            Intent::SendConnectionRequest { user_id } => (
                None,
                vec![
                    CacheKey::SuggestedConnections,
                    CacheKey::ConnectionStatus(user_id.clone()),
                    CacheKey::IsConnected(user_id.clone()),
                ],
            ),
            Intent::AcceptConnectionRequest { .. } => (
                Some(CacheKey::ConnectionRequests),
                vec![
                    CacheKey::ConnectionRequests,
                    CacheKey::Connections,
                    CacheKey::SuggestedConnections,
                ],
            ),
            Intent::DeclineConnectionRequest { .. } => (
                Some(CacheKey::ConnectionRequests),
                vec![CacheKey::ConnectionRequests],
            ),
            Intent::RemoveConnection { user_id } => (
                Some(CacheKey::Connections),
                vec![
                    CacheKey::Connections,
                    CacheKey::SuggestedConnections,
                    CacheKey::ConnectionStatus(user_id.clone()),
                    CacheKey::IsConnected(user_id.clone()),
                ],
            ),
            Intent::UpdateProfile(_) => (
                None,
                vec![CacheKey::CurrentUser, CacheKey::User(actor.to_string())],
            ),
        };
        Policy {
            reconciliation,
            projects_onto,
            invalidates,
        }
    }
}
