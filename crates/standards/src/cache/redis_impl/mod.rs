//! Redis cache and event bus for multi-instance deployments.

mod bus;
mod cache;
mod error;

pub use bus::RedisEventBus;
pub use cache::RedisCache;
