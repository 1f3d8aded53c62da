//! Redis pub/sub event bus.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::StreamExt;
use redis::AsyncCommands;
use tokio::sync::{broadcast, RwLock};

use standards_core::cache::{CacheError, EventBus, Result};
use standards_core::events::DomainEvent;

use super::error::map_redis_error;

const CHANNEL_CAPACITY: usize = 256;

type Subscriptions = Arc<RwLock<HashMap<String, broadcast::Sender<DomainEvent>>>>;

/// Event bus shared by every instance connected to the same Redis server.
///
/// Each topic gets one Redis subscription per process, fanned out to local
/// receivers through a broadcast channel.
pub struct RedisEventBus {
    client: redis::Client,
    subscriptions: Subscriptions,
}

impl RedisEventBus {
    /// Creates a new Redis pub/sub connection.
    ///
    /// # Errors
    ///
    /// Returns `CacheError::ConnectionFailed` if the connection cannot be established.
    pub async fn new(url: &str) -> Result<Self> {
        let client = redis::Client::open(url).map_err(map_redis_error)?;

        // Verify connection by getting a connection
        let _ = client
            .get_multiplexed_async_connection()
            .await
            .map_err(map_redis_error)?;

        Ok(Self {
            client,
            subscriptions: Arc::new(RwLock::new(HashMap::new())),
        })
    }
}

#[async_trait]
impl EventBus for RedisEventBus {
    async fn publish(&self, topic: &str, event: &DomainEvent) -> Result<()> {
        let payload =
            serde_json::to_string(event).map_err(|e| CacheError::Serialization(e.to_string()))?;

        let mut conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(map_redis_error)?;

        conn.publish::<_, _, ()>(topic, &payload)
            .await
            .map_err(|e| CacheError::PublishFailed(e.to_string()))?;

        Ok(())
    }

    async fn subscribe(&self, topic: &str) -> Result<broadcast::Receiver<DomainEvent>> {
        {
            let subscriptions = self.subscriptions.read().await;
            if let Some(sender) = subscriptions.get(topic) {
                return Ok(sender.subscribe());
            }
        }

        let (tx, rx) = broadcast::channel(CHANNEL_CAPACITY);
        {
            let mut subscriptions = self.subscriptions.write().await;
            // Double-check in case another task created it
            if let Some(sender) = subscriptions.get(topic) {
                return Ok(sender.subscribe());
            }
            subscriptions.insert(topic.to_string(), tx.clone());
        }

        // Subscribe before returning so no message published afterwards is missed.
        let mut pubsub = match self.client.get_async_pubsub().await {
            Ok(pubsub) => pubsub,
            Err(e) => {
                self.subscriptions.write().await.remove(topic);
                return Err(map_redis_error(e));
            }
        };
        if let Err(e) = pubsub.subscribe(topic).await {
            self.subscriptions.write().await.remove(topic);
            return Err(map_redis_error(e));
        }

        let topic = topic.to_string();
        let subscriptions = Arc::clone(&self.subscriptions);
        tokio::spawn(async move {
            let mut stream = pubsub.on_message();
            while let Some(msg) = stream.next().await {
                let payload: String = match msg.get_payload() {
                    Ok(payload) => payload,
                    Err(e) => {
                        tracing::warn!(topic = %topic, error = %e, "Unreadable Redis message");
                        continue;
                    }
                };
                match serde_json::from_str::<DomainEvent>(&payload) {
                    // No receivers left is fine; the next subscribe reuses the sender.
                    Ok(event) => {
                        let _ = tx.send(event);
                    }
                    Err(e) => {
                        tracing::warn!(topic = %topic, error = %e, "Failed to deserialize domain event");
                    }
                }
            }

            tracing::info!(topic = %topic, "Redis subscription stream ended");
            subscriptions.write().await.remove(&topic);
        });

        Ok(rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use standards_core::domain::EntityKind;
    use std::time::Duration;
    use uuid::Uuid;

    fn redis_url() -> String {
        std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string())
    }

    #[tokio::test]
    async fn test_redis_publish_and_subscribe() {
        let Ok(bus) = RedisEventBus::new(&redis_url()).await else {
            eprintln!("Skipping test: Redis not available");
            return;
        };

        let topic = format!("test:bus:{}", Uuid::new_v4());
        let mut rx = bus.subscribe(&topic).await.unwrap();
        let event = DomainEvent::created(EntityKind::Position, Uuid::new_v4(), json!({"name": "Engineer"}));

        bus.publish(&topic, &event).await.unwrap();

        let received = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("timed out waiting for event")
            .unwrap();
        assert_eq!(received.id, event.id);
    }
}
