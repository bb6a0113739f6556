use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Serialization lane: one actor acting on one target.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IntentLane {
    pub actor: String,
    pub target: String,
}

impl IntentLane {
    pub fn new(actor: impl Into<String>, target: impl Into<String>) -> Self {
        IntentLane {
            actor: actor.into(),
            target: target.into(),
        }
    }
}

impl fmt::Display for IntentLane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.actor, self.target)
    }
}

type Lanes = Arc<Mutex<HashMap<IntentLane, Arc<AsyncMutex<()>>>>>;

/// Per-lane FIFO of intents. At most one intent per lane is in flight; later
/// ones wait in arrival order until the lane frees up.
#[derive(Clone, Default)]
pub struct IntentQueue {
    lanes: Lanes,
}

impl IntentQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for `lane` to be free and hold it until the guard drops.
    ///
    /// Cancelling the wait releases the lane entry like a dropped guard.
    pub async fn enter(&self, lane: IntentLane) -> LaneGuard {
        let mut entry = LaneGuard {
            lanes: self.lanes.clone(),
            lane,
            guard: None,
        };
        let lock = self.ensure_lock(&entry.lane);
        entry.guard = Some(lock.lock_owned().await);
        entry
    }

    pub fn is_busy(&self, lane: &IntentLane) -> bool {
        let lanes = self.lanes.lock().unwrap_or_else(PoisonError::into_inner);
        lanes
            .get(lane)
            .is_some_and(|lock| lock.try_lock().is_err())
    }

    /// Lanes with an intent in flight or waiting.
    pub fn active(&self) -> usize {
        self.lanes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn ensure_lock(&self, lane: &IntentLane) -> Arc<AsyncMutex<()>> {
        let mut lanes = self.lanes.lock().unwrap_or_else(PoisonError::into_inner);
        // Sweep entries nobody holds or waits on.
        lanes.retain(|_, lock| Arc::strong_count(lock) > 1);
        lanes
            .entry(lane.clone())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }
}

/// Holds a lane, or waits for it while `guard` is empty. Dropping it lets
/// the next waiter in; the lane entry is removed once nobody references it.
pub struct LaneGuard {
    lanes: Lanes,
    lane: IntentLane,
    guard: Option<OwnedMutexGuard<()>>,
}

impl LaneGuard {
    pub fn lane(&self) -> &IntentLane {
        &self.lane
    }
}

impl Drop for LaneGuard {
    fn drop(&mut self) {
        let mut lanes = self.lanes.lock().unwrap_or_else(PoisonError::into_inner);
        self.guard.take();
        // Map entry plus nobody else: no waiter, no holder.
        if lanes
            .get(&self.lane)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            lanes.remove(&self.lane);
        }
    }
}
