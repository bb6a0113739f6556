mod cache;
mod composer;
mod config;
mod engine;
mod model;
mod remote;
mod session;

pub use cache::{CacheKey, CacheStore, CacheValue, Cacheable, InMemoryCache};
pub use composer::Composer;
pub use config::{ClientConfig, DEFAULT_API_URL, DEFAULT_REQUEST_TIMEOUT_SECS};
pub use engine::events;
pub use engine::{
    CacheEvent, Confirmation, Effect, Intent, IntentEvent, IntentId, IntentKind, IntentLane,
    IntentPhase, IntentQueue, LaneGuard, Notifier, Policy, Receipt, Reconciliation, SyncEngine,
    SyncError,
};
pub use model::{
    AuthRequest, AuthResponse, Comment, ConnectionRequest, ConnectionStatus, Credentials,
    LinkState, NewComment, NewConnectionRequest, NewPost, Post, ProfileUpdate, Registration,
    Removal, RequestStatus, User,
};
pub use remote::{Method, RemoteError, RemoteStore, Route, DEFAULT_MESSAGE};
pub use session::{expiry, Session, SessionContext, SessionError};

#[cfg(feature = "http")]
pub use remote::HttpRemoteStore;

// Re-export the EventEmitter from the event_emitter_rs crate
pub use event_emitter_rs::EventEmitter;
