//! Wire records exchanged with the backend.
//!
//! Field names follow the backend's JSON: `_id` for identity and camelCase
//! everywhere else.

mod auth;
mod connection;
mod post;
mod user;

pub use auth::{AuthRequest, AuthResponse, Credentials, Registration};
pub use connection::{
    ConnectionRequest, ConnectionStatus, LinkState, NewConnectionRequest, Removal, RequestStatus,
};
pub use post::{Comment, NewComment, NewPost, Post};
pub use user::{ProfileUpdate, User};
