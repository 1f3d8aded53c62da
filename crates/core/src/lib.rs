//! Functional core for the standards service.
//!
//! Nothing here touches the network or disk. It holds entity definitions
//! and their validation rules, the query model, cache keys and expiration,
//! repository contracts, domain events and the retry policy.

pub mod cache;
pub mod domain;
pub mod events;
pub mod query;
pub mod retry;
pub mod serde;
pub mod storage;
