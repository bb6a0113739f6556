use serde_json::Value;

use crate::model::{ConnectionRequest, ConnectionStatus, Post, User};

use super::key::CacheKey;

/// Everything the cache can hold, one variant per collection shape.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheValue {
    Posts(Vec<Post>),
    Users(Vec<User>),
    User(User),
    Requests(Vec<ConnectionRequest>),
    Status(ConnectionStatus),
    Flag(bool),
}

impl CacheValue {
    /// Decode a response body into the shape stored under `key`.
    pub fn decode(key: &CacheKey, body: Value) -> Result<CacheValue, serde_json::Error> {
        Ok(match key {
            CacheKey::Posts | CacheKey::UserPosts(_) => {
                CacheValue::Posts(serde_json::from_value(body)?)
            }
            CacheKey::User(_) | CacheKey::CurrentUser => {
                CacheValue::User(serde_json::from_value(body)?)
            }
            CacheKey::Connections | CacheKey::SuggestedConnections => {
                CacheValue::Users(serde_json::from_value(body)?)
            }
            CacheKey::ConnectionRequests => CacheValue::Requests(serde_json::from_value(body)?),
            CacheKey::ConnectionStatus(_) => CacheValue::Status(serde_json::from_value(body)?),
            CacheKey::IsConnected(_) => CacheValue::Flag(serde_json::from_value(body)?),
        })
    }

    pub fn len(&self) -> usize {
        match self {
            CacheValue::Posts(posts) => posts.len(),
            CacheValue::Users(users) => users.len(),
            CacheValue::Requests(requests) => requests.len(),
            CacheValue::User(_) | CacheValue::Status(_) | CacheValue::Flag(_) => 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Typed view of a [`CacheValue`] variant.
pub trait Cacheable: Sized {
    fn into_value(self) -> CacheValue;
    fn from_value(value: CacheValue) -> Option<Self>;
}

macro_rules! cacheable {
    ($ty:ty, $variant:ident) => {
        impl Cacheable for $ty {
            fn into_value(self) -> CacheValue {
                CacheValue::$variant(self)
            }

            fn from_value(value: CacheValue) -> Option<Self> {
                match value {
                    CacheValue::$variant(inner) => Some(inner),
                    _ => None,
                }
            }
        }
    };
}

cacheable!(Vec<Post>, Posts);
cacheable!(Vec<User>, Users);
cacheable!(User, User);
cacheable!(Vec<ConnectionRequest>, Requests);
cacheable!(ConnectionStatus, Status);
cacheable!(bool, Flag);
