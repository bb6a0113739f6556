//! Arena of in-flight intents and the snapshots they own.
//!
//! Every issued intent holds one slot until it reaches a terminal phase.
//! Applied intents additionally own the snapshot of the collection they were
//! projected onto. Slots are ordered by issue, which is the order effects are
//! replayed in when a collection is rebased.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::cache::{CacheKey, CacheStore, CacheValue};

use super::effect::Effect;
use super::intent::Intent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IntentId(u64);

impl IntentId {
    pub(crate) fn new(id: u64) -> Self {
        IntentId(id)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for IntentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "intent-{}", self.0)
    }
}

/// `Issued → Applied → {Confirmed | Reverted}`. Intents without a local
/// projection go straight from `Issued` to a terminal phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentPhase {
    Issued,
    Applied,
    Confirmed,
    Reverted,
}

impl IntentPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            IntentPhase::Issued => "issued",
            IntentPhase::Applied => "applied",
            IntentPhase::Confirmed => "confirmed",
            IntentPhase::Reverted => "reverted",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, IntentPhase::Confirmed | IntentPhase::Reverted)
    }

    pub fn can_advance_to(self, next: IntentPhase) -> bool {
        match self {
            IntentPhase::Issued => next != IntentPhase::Issued,
            IntentPhase::Applied => next.is_terminal(),
            IntentPhase::Confirmed | IntentPhase::Reverted => false,
        }
    }
}

impl fmt::Display for IntentPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug)]
struct Projection {
    key: CacheKey,
    effect: Effect,
    snapshot: CacheValue,
}

#[derive(Debug)]
struct Slot {
    phase: IntentPhase,
    projection: Option<Projection>,
}

#[derive(Debug, Default)]
pub(crate) struct InFlight {
    last_id: u64,
    /// Bumped whenever the session changes. Work started under an older
    /// generation must not write into the cache.
    generation: u64,
    slots: BTreeMap<IntentId, Slot>,
}

impl InFlight {
    pub fn issue(&mut self) -> IntentId {
        self.last_id += 1;
        let id = IntentId::new(self.last_id);
        self.slots.insert(
            id,
            Slot {
                phase: IntentPhase::Issued,
                projection: None,
            },
        );
        id
    }

    /// Snapshot `key`, project the intent's effect onto it and store the
    /// result. Returns the effect, or `None` when nothing could be projected
    /// (collection not cached, target absent, intent unknown or not `Issued`).
    pub fn apply<C: CacheStore>(
        &mut self,
        id: IntentId,
        key: &CacheKey,
        intent: &Intent,
        actor: &str,
        cache: &C,
    ) -> Option<Effect> {
        let slot = self.slots.get_mut(&id)?;
        if !slot.phase.can_advance_to(IntentPhase::Applied) {
            return None;
        }
        let snapshot = cache.get(key)?;
        let effect = Effect::resolve(intent, actor, &snapshot)?;
        let projected = effect.apply(&snapshot);

        slot.phase = IntentPhase::Applied;
        slot.projection = Some(Projection {
            key: key.clone(),
            effect: effect.clone(),
            snapshot,
        });
        cache.set(key.clone(), projected);
        Some(effect)
    }

    /// Terminal success: the snapshot is discarded. Returns the phase the
    /// intent was in.
    pub fn confirm(&mut self, id: IntentId) -> Option<IntentPhase> {
        self.slots.remove(&id).map(|slot| slot.phase)
    }

    /// Terminal failure: restore the snapshot, replaying the projections of
    /// intents issued later on the same collection. Returns the phase the
    /// intent was in.
    pub fn revert<C: CacheStore>(&mut self, id: IntentId, cache: &C) -> Option<IntentPhase> {
        let slot = self.slots.remove(&id)?;
        if let Some(projection) = slot.projection {
            self.rebase(&projection.key, projection.snapshot, Some(id), cache);
        }
        Some(slot.phase)
    }

    /// Store an authoritative value for `key`, keeping every pending
    /// projection on top of it. Returns what was stored, or `None` when the
    /// value was fetched under an earlier `generation` and got dropped.
    pub fn store_fetched<C: CacheStore>(
        &mut self,
        key: &CacheKey,
        value: CacheValue,
        generation: u64,
        cache: &C,
    ) -> Option<CacheValue> {
        if generation != self.generation {
            return None;
        }
        Some(self.rebase(key, value, None, cache))
    }

    /// Detach every unsettled intent and start a new generation. Detached
    /// intents settle without touching the cache. Returns how many there were.
    pub fn reset(&mut self) -> usize {
        self.generation += 1;
        let detached = self.slots.len();
        self.slots.clear();
        detached
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    fn rebase<C: CacheStore>(
        &mut self,
        key: &CacheKey,
        base: CacheValue,
        after: Option<IntentId>,
        cache: &C,
    ) -> CacheValue {
        let mut running = base;
        for (id, slot) in self.slots.iter_mut() {
            if after.is_some_and(|after| *id <= after) {
                continue;
            }
            if let Some(projection) = slot.projection.as_mut().filter(|p| &p.key == key) {
                let next = projection.effect.apply(&running);
                projection.snapshot = std::mem::replace(&mut running, next);
            }
        }
        cache.set(key.clone(), running.clone());
        running
    }

    pub fn phase(&self, id: IntentId) -> Option<IntentPhase> {
        self.slots.get(&id).map(|slot| slot.phase)
    }

    /// Intents issued but not yet settled.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Snapshots currently held for `key`.
    pub fn projected_on(&self, key: &CacheKey) -> usize {
        self.slots
            .values()
            .filter(|slot| slot.projection.as_ref().is_some_and(|p| &p.key == key))
            .count()
    }
}
