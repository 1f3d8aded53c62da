mod error;
mod expiration;
mod keys;
mod patterns;
mod serialization;
mod traits;

pub use error::{CacheError, Result};
pub use expiration::Expiration;
pub use keys::{
    entity_key, entity_list_key, entity_lists_pattern, entity_query_key, extract_kind,
    is_list_key, kind_tracking_key, DOMAIN_EVENTS_TOPIC,
};
pub use patterns::pattern_matches;
pub use serialization::{decode, encode, SerializationError};
pub use traits::{Cache, EventBus};
