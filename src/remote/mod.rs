//! The backend REST service and how the client reaches it.

mod error;
mod route;
mod store;

pub use error::{RemoteError, DEFAULT_MESSAGE};
pub use route::{Method, Route};
pub use store::RemoteStore;

// HTTP transport (requires "http" feature)
#[cfg(feature = "http")]
mod http;
#[cfg(feature = "http")]
pub use http::HttpRemoteStore;
