//! Mapping from reads, intents and auth requests to backend endpoints.

use std::fmt;

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use serde_json::{json, Value};

use crate::cache::CacheKey;
use crate::engine::Intent;
use crate::model::{AuthRequest, NewComment, NewConnectionRequest};

/// Characters escaped inside a single path segment.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// An id escaped for use as one path segment.
fn segment(id: &str) -> String {
    utf8_percent_encode(id, SEGMENT).to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        })
    }
}

/// One request against the backend, relative to the configured base URL.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
}

impl Route {
    fn get(path: impl Into<String>) -> Self {
        Route {
            method: Method::Get,
            path: path.into(),
            body: None,
        }
    }

    fn with_body(method: Method, path: impl Into<String>, body: Value) -> Self {
        Route {
            method,
            path: path.into(),
            body: Some(body),
        }
    }

    /// Endpoint that returns the collection stored under `key`.
    pub fn fetch(key: &CacheKey) -> Self {
        match key {
            CacheKey::Posts => Route::get("/posts"),
            CacheKey::UserPosts(id) => Route::get(format!("/posts/user/{}", segment(id))),
            CacheKey::User(id) => Route::get(format!("/users/{}", segment(id))),
            CacheKey::CurrentUser => Route::get("/auth/me"),
            CacheKey::Connections => Route::get("/connections"),
            CacheKey::ConnectionRequests => Route::get("/connections/requests"),
            CacheKey::SuggestedConnections => Route::get("/connections/suggestions"),
            CacheKey::ConnectionStatus(id) => {
                Route::get(format!("/connections/status/{}", segment(id)))
            }
            CacheKey::IsConnected(id) => {
                Route::get(format!("/connections/check/{}", segment(id)))
            }
        }
    }

    /// Endpoint that performs `intent`.
    pub fn dispatch(intent: &Intent) -> Result<Self, serde_json::Error> {
        Ok(match intent {
            Intent::ToggleLike { post_id, .. } => {
                Route::with_body(
                    Method::Put,
                    format!("/posts/{}/like", segment(post_id)),
                    json!({}),
                )
            }
            Intent::CreateComment { post_id, content } => Route::with_body(
                Method::Post,
                format!("/posts/{}/comments", segment(post_id)),
                serde_json::to_value(NewComment {
                    content: content.clone(),
                })?,
            ),
            Intent::CreatePost(post) => {
                Route::with_body(Method::Post, "/posts", serde_json::to_value(post)?)
            }
            Intent::SendConnectionRequest { user_id } => Route::with_body(
                Method::Post,
                "/connections/request",
                serde_json::to_value(NewConnectionRequest {
                    user_id: user_id.clone(),
                })?,
            ),
            Intent::AcceptConnectionRequest { request_id } => Route::with_body(
                Method::Put,
                format!("/connections/request/{}/accept", segment(request_id)),
                json!({}),
            ),
            Intent::DeclineConnectionRequest { request_id } => Route::with_body(
                Method::Put,
                format!("/connections/request/{}/decline", segment(request_id)),
                json!({}),
            ),
            Intent::RemoveConnection { user_id } => Route {
                method: Method::Delete,
                path: format!("/connections/{}", segment(user_id)),
                body: None,
            },
            Intent::UpdateProfile(update) => {
                Route::with_body(Method::Put, "/users/profile", serde_json::to_value(update)?)
            }
        })
    }

    /// Endpoint that exchanges credentials for a session token.
    pub fn authenticate(request: &AuthRequest) -> Result<Self, serde_json::Error> {
        Ok(match request {
            AuthRequest::Login(credentials) => Route::with_body(
                Method::Post,
                "/auth/login",
                serde_json::to_value(credentials)?,
            ),
            AuthRequest::Register(registration) => Route::with_body(
                Method::Post,
                "/auth/register",
                serde_json::to_value(registration)?,
            ),
        })
    }
}
