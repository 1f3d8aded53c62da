//! In-process cache and event bus.

mod bus;
mod cache;

pub use bus::MemoryEventBus;
pub use cache::MemoryCache;
