//! CacheStore - the local keyed store the engine renders from.

use super::key::CacheKey;
use super::value::{CacheValue, Cacheable};

/// Keyed store of previously fetched server collections.
///
/// Infallible by contract: implementations never surface errors. Readers
/// always see the value of the latest `set`.
pub trait CacheStore: Send + Sync {
    /// Current value for `key`, stale or not. No network access.
    fn get(&self, key: &CacheKey) -> Option<CacheValue>;

    /// Replace the value for `key` and mark the entry fresh.
    fn set(&self, key: CacheKey, value: CacheValue);

    /// Mark the entry stale so the next query refetches it. The value stays
    /// readable. Returns whether an entry existed.
    fn invalidate(&self, key: &CacheKey) -> bool;

    /// Whether the next query must refetch. Absent entries count as stale.
    fn is_stale(&self, key: &CacheKey) -> bool;

    /// Number of invalidations seen by `key` so far.
    fn epoch(&self, key: &CacheKey) -> u64;

    /// Drop the entry. Returns the value it held.
    fn remove(&self, key: &CacheKey) -> Option<CacheValue>;

    /// Drop every entry.
    fn clear(&self);

    fn keys(&self) -> Vec<CacheKey>;

    /// Typed read. A shape mismatch reads as absent.
    fn get_as<T: Cacheable>(&self, key: &CacheKey) -> Option<T>
    where
        Self: Sized,
    {
        self.get(key).and_then(T::from_value)
    }
}
