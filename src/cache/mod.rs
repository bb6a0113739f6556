mod in_memory;
mod key;
mod store;
mod value;

pub use in_memory::InMemoryCache;
pub use key::CacheKey;
pub use store::CacheStore;
pub use value::{CacheValue, Cacheable};
