use std::fmt;

/// Identifies one cached server collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CacheKey {
    /// The main feed.
    Posts,
    /// Posts authored by one user.
    UserPosts(String),
    /// A single member profile.
    User(String),
    /// The session user, as the backend sees it.
    CurrentUser,
    Connections,
    ConnectionRequests,
    SuggestedConnections,
    /// Relationship between the session user and another member.
    ConnectionStatus(String),
    IsConnected(String),
}

impl CacheKey {
    /// Whether values under this key are lists of posts.
    pub fn holds_posts(&self) -> bool {
        matches!(self, CacheKey::Posts | CacheKey::UserPosts(_))
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKey::Posts => write!(f, "posts"),
            CacheKey::UserPosts(id) => write!(f, "userPosts/{}", id),
            CacheKey::User(id) => write!(f, "user/{}", id),
            CacheKey::CurrentUser => write!(f, "currentUser"),
            CacheKey::Connections => write!(f, "connections"),
            CacheKey::ConnectionRequests => write!(f, "connectionRequests"),
            CacheKey::SuggestedConnections => write!(f, "suggestedConnections"),
            CacheKey::ConnectionStatus(id) => write!(f, "connectionStatus/{}", id),
            CacheKey::IsConnected(id) => write!(f, "isConnected/{}", id),
        }
    }
}
