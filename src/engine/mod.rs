//! The synchronization engine: intents, their reconciliation policy and the
//! optimistic snapshot/rebase machinery.

mod effect;
mod engine;
mod error;
pub mod events;
mod inflight;
mod intent;
mod policy;
mod queue;

pub use effect::Effect;
pub use engine::{Receipt, SyncEngine};
pub use error::SyncError;
pub use events::{CacheEvent, IntentEvent, Notifier};
pub use inflight::{IntentId, IntentPhase};
pub use intent::{Confirmation, Intent, IntentKind};
pub use policy::{Policy, Reconciliation};
pub use queue::{IntentLane, IntentQueue, LaneGuard};
