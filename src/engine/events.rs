//! Lifecycle notifications for intents and cache invalidations.
//!
//! Listeners run on the emitter's own threads, never on the dispatching
//! task, so a slow listener cannot hold up an intent.

use std::sync::{Mutex, PoisonError};

use event_emitter_rs::EventEmitter;
use serde::{Deserialize, Serialize};

use crate::cache::CacheKey;

use super::inflight::{IntentId, IntentPhase};
use super::intent::IntentKind;

/// Every intent phase change.
pub const INTENT: &str = "intent";
pub const INTENT_ISSUED: &str = "intent.issued";
pub const INTENT_APPLIED: &str = "intent.applied";
pub const INTENT_CONFIRMED: &str = "intent.confirmed";
pub const INTENT_REVERTED: &str = "intent.reverted";
pub const CACHE_INVALIDATED: &str = "cache.invalidated";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntentEvent {
    pub id: u64,
    pub kind: IntentKind,
    pub actor: String,
    pub target: String,
    pub phase: IntentPhase,
    /// Failure message for `Reverted`.
    pub error: Option<String>,
}

impl IntentEvent {
    pub fn event_name(&self) -> &'static str {
        match self.phase {
            IntentPhase::Issued => INTENT_ISSUED,
            IntentPhase::Applied => INTENT_APPLIED,
            IntentPhase::Confirmed => INTENT_CONFIRMED,
            IntentPhase::Reverted => INTENT_REVERTED,
        }
    }

    pub fn intent_id(&self) -> IntentId {
        IntentId::new(self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEvent {
    pub key: String,
}

pub struct Notifier {
    emitter: Mutex<EventEmitter>,
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier {
    pub fn new() -> Self {
        Notifier {
            emitter: Mutex::new(EventEmitter::new()),
        }
    }

    /// Listen to intent events. `event` is [`INTENT`] or one of the
    /// per-phase names. Returns the listener id.
    pub fn on_intent<F>(&self, event: &str, listener: F) -> String
    where
        F: Fn(IntentEvent) + Send + Sync + 'static,
    {
        self.on_json(event, listener)
    }

    pub fn on_cache<F>(&self, listener: F) -> String
    where
        F: Fn(CacheEvent) + Send + Sync + 'static,
    {
        self.on_json(CACHE_INVALIDATED, listener)
    }

    /// Remove a listener by the id `on_*` returned.
    pub fn off(&self, id: &str) -> bool {
        self.emitter().remove_listener(id).is_some()
    }

    pub(crate) fn intent(&self, event: IntentEvent) {
        let Some(payload) = encode(&event) else {
            return;
        };
        let mut emitter = self.emitter();
        emitter.emit(event.event_name(), payload.clone());
        emitter.emit(INTENT, payload);
    }

    pub(crate) fn invalidated(&self, key: &CacheKey) {
        let event = CacheEvent {
            key: key.to_string(),
        };
        if let Some(payload) = encode(&event) {
            self.emitter().emit(CACHE_INVALIDATED, payload);
        }
    }

    fn on_json<T, F>(&self, event: &str, listener: F) -> String
    where
        T: for<'de> Deserialize<'de>,
        F: Fn(T) + Send + Sync + 'static,
    {
        self.emitter()
            .on(event, move |payload: String| match serde_json::from_str(&payload) {
                Ok(decoded) => listener(decoded),
                Err(err) => tracing::warn!(error = %err, "dropping undecodable notification"),
            })
    }

    fn emitter(&self) -> std::sync::MutexGuard<'_, EventEmitter> {
        self.emitter.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn encode<T: Serialize>(event: &T) -> Option<String> {
    serde_json::to_string(event)
        .map_err(|err| tracing::warn!(error = %err, "failed to encode notification"))
        .ok()
}
