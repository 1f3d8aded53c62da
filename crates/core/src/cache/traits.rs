use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::events::DomainEvent;

use super::{Expiration, Result};

/// Byte-level key/value cache.
#[async_trait]
pub trait Cache: Send + Sync {
    /// Gets a value by key. A hit refreshes the entry's sliding window.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Stores a value with the given expiration, replacing any previous value.
    async fn set(&self, key: &str, value: &[u8], expiration: Expiration) -> Result<()>;

    /// Deletes a value by key. Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<()>;

    /// Deletes every key matching a glob pattern (e.g. `"room:list:*"`).
    async fn delete_pattern(&self, pattern: &str) -> Result<()>;
}

/// Topic-based publish/subscribe for domain events.
#[async_trait]
pub trait EventBus: Send + Sync {
    /// Publishes an event to every current subscriber of `topic`.
    async fn publish(&self, topic: &str, event: &DomainEvent) -> Result<()>;

    /// Subscribes to events published on `topic` from now on.
    async fn subscribe(&self, topic: &str) -> Result<broadcast::Receiver<DomainEvent>>;
}
