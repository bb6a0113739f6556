//! Session context: the bearer credential and its login/logout lifecycle.

mod context;
mod session;
mod token;

pub use context::{SessionContext, SessionError};
pub use session::Session;
pub use token::expiry;
