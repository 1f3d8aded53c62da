//! Cache and event bus backends plus the cache-aside service.
//!
//! The backends implement the traits in `standards_core::cache` and are
//! selected at compile time via feature flags:
//!
//! - `memory` (default): LRU cache and broadcast channels in this process
//! - `redis`: Redis hashes for entries and Redis pub/sub for events
//!
//! These features are mutually exclusive.

#[cfg(all(feature = "memory", feature = "redis"))]
compile_error!(
    "Features 'memory' and 'redis' are mutually exclusive. \
    Enable only one cache backend at a time."
);

#[cfg(not(any(feature = "memory", feature = "redis")))]
compile_error!(
    "No cache backend selected. Enable 'memory' or 'redis' feature. \
    Example: cargo build -p standards --features memory"
);

// The memory backend doubles as the test cache for every feature set.
#[cfg(any(feature = "memory", test))]
pub mod memory;

#[cfg(feature = "redis")]
pub mod redis_impl;

mod service;

#[cfg(any(feature = "memory", test))]
#[allow(unused_imports)]
pub use memory::{MemoryCache, MemoryEventBus};

#[cfg(feature = "redis")]
#[allow(unused_imports)]
pub use redis_impl::{RedisCache, RedisEventBus};

pub use service::CacheService;
