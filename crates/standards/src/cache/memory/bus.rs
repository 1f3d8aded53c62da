//! In-process event bus over tokio broadcast channels, one per topic.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{broadcast, RwLock};

use standards_core::cache::{EventBus, Result};
use standards_core::events::DomainEvent;

/// Channel capacity for bus messages.
const CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, Default)]
pub struct MemoryEventBus {
    channels: Arc<RwLock<HashMap<String, broadcast::Sender<DomainEvent>>>>,
}

impl MemoryEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    async fn get_or_create_channel(&self, topic: &str) -> broadcast::Sender<DomainEvent> {
        {
            let channels = self.channels.read().await;
            if let Some(sender) = channels.get(topic) {
                return sender.clone();
            }
        }

        let mut channels = self.channels.write().await;
        // Double-check after acquiring write lock
        if let Some(sender) = channels.get(topic) {
            return sender.clone();
        }

        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        channels.insert(topic.to_string(), sender.clone());
        sender
    }
}

#[async_trait]
impl EventBus for MemoryEventBus {
    async fn publish(&self, topic: &str, event: &DomainEvent) -> Result<()> {
        let sender = self.get_or_create_channel(topic).await;
        // No receivers is not an error: nobody is listening on this topic yet.
        let _ = sender.send(event.clone());
        Ok(())
    }

    async fn subscribe(&self, topic: &str) -> Result<broadcast::Receiver<DomainEvent>> {
        Ok(self.get_or_create_channel(topic).await.subscribe())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use standards_core::cache::DOMAIN_EVENTS_TOPIC;
    use standards_core::domain::EntityKind;
    use uuid::Uuid;

    fn event() -> DomainEvent {
        DomainEvent::created(EntityKind::Quantity, Uuid::new_v4(), json!({"name": "Length"}))
    }

    #[tokio::test]
    async fn test_publish_and_subscribe() {
        let bus = MemoryEventBus::new();
        let mut rx = bus.subscribe(DOMAIN_EVENTS_TOPIC).await.unwrap();
        let event = event();

        bus.publish(DOMAIN_EVENTS_TOPIC, &event).await.unwrap();

        assert_eq!(rx.recv().await.unwrap(), event);
    }

    #[tokio::test]
    async fn test_publish_without_subscribers() {
        let bus = MemoryEventBus::new();
        assert!(bus.publish(DOMAIN_EVENTS_TOPIC, &event()).await.is_ok());
    }

    #[tokio::test]
    async fn test_multiple_subscribers_receive_same_event() {
        let bus = MemoryEventBus::new();
        let mut rx1 = bus.subscribe(DOMAIN_EVENTS_TOPIC).await.unwrap();
        let mut rx2 = bus.subscribe(DOMAIN_EVENTS_TOPIC).await.unwrap();
        let event = event();

        bus.publish(DOMAIN_EVENTS_TOPIC, &event).await.unwrap();

        assert_eq!(rx1.recv().await.unwrap().id, event.id);
        assert_eq!(rx2.recv().await.unwrap().id, event.id);
    }

    #[tokio::test]
    async fn test_topics_are_isolated() {
        let bus = MemoryEventBus::new();
        let mut other = bus.subscribe("channel:other").await.unwrap();

        bus.publish(DOMAIN_EVENTS_TOPIC, &event()).await.unwrap();

        assert!(matches!(
            other.try_recv(),
            Err(broadcast::error::TryRecvError::Empty)
        ));
    }
}
