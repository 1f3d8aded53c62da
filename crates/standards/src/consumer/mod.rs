//! At-least-once consumer of domain events.
//!
//! Events arrive from the [`EventBus`] and are passed to every registered
//! [`EventHandler`], each through the retry policy. An event id is only
//! remembered as handled once every handler succeeded, so redelivered
//! duplicates of a handled event are skipped while failed ones are not.

mod handlers;

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use lru::LruCache;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use uuid::Uuid;

use standards_core::cache::{EventBus, DOMAIN_EVENTS_TOPIC};
use standards_core::events::DomainEvent;
use standards_core::retry::RetryPolicy;

pub use handlers::{CacheInvalidationHandler, EventHistoryHandler};

/// Number of recently handled event ids remembered for deduplication.
const DEDUP_CAPACITY: NonZeroUsize = match NonZeroUsize::new(4096) {
    Some(n) => n,
    None => NonZeroUsize::MIN,
};

/// Reacts to one domain event. Must be idempotent.
#[async_trait]
pub trait EventHandler: Send + Sync {
    fn name(&self) -> &'static str;

    async fn handle(&self, event: &DomainEvent) -> anyhow::Result<()>;
}

/// What happened to a delivered event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Handled,
    Duplicate,
    /// At least one handler still failed after its retries.
    Failed,
}

pub struct EventConsumer {
    bus: Arc<dyn EventBus>,
    handlers: Vec<Arc<dyn EventHandler>>,
    retry: RetryPolicy,
    handled: Mutex<LruCache<Uuid, ()>>,
}

impl EventConsumer {
    pub fn new(bus: Arc<dyn EventBus>, retry: RetryPolicy) -> Self {
        Self {
            bus,
            handlers: Vec::new(),
            retry,
            handled: Mutex::new(LruCache::new(DEDUP_CAPACITY)),
        }
    }

    pub fn with_handler(mut self, handler: impl EventHandler + 'static) -> Self {
        self.handlers.push(Arc::new(handler));
        self
    }

    fn is_handled(&self, id: Uuid) -> bool {
        self.handled
            .lock()
            .map(|handled| handled.contains(&id))
            .unwrap_or(false)
    }

    fn remember(&self, id: Uuid) {
        if let Ok(mut handled) = self.handled.lock() {
            handled.put(id, ());
        }
    }

    /// Runs every handler for `event` unless it was already handled.
    pub async fn deliver(&self, event: &DomainEvent) -> Delivery {
        if self.is_handled(event.id) {
            tracing::debug!(event_id = %event.id, "Skipping duplicate event");
            return Delivery::Duplicate;
        }

        let mut failed = false;
        for handler in &self.handlers {
            let result = self
                .retry
                .run_notify(
                    |_| handler.handle(event),
                    |attempt, error, _delay| {
                        tracing::debug!(
                            handler = handler.name(),
                            event_id = %event.id,
                            attempt,
                            error = %error,
                            "Retrying event handler"
                        );
                    },
                )
                .await;

            if let Err(e) = result {
                failed = true;
                tracing::error!(
                    handler = handler.name(),
                    event_id = %event.id,
                    event_type = %event.event_type(),
                    error = %e,
                    "Event handler failed"
                );
            }
        }

        if failed {
            return Delivery::Failed;
        }
        self.remember(event.id);
        Delivery::Handled
    }

    /// Subscribes to the domain events topic and handles events on a
    /// background task until shutdown or until the bus closes.
    pub async fn spawn(
        self,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) -> standards_core::cache::Result<JoinHandle<()>> {
        let mut receiver = self.bus.subscribe(DOMAIN_EVENTS_TOPIC).await?;

        Ok(tokio::spawn(async move {
            tracing::info!(handlers = self.handlers.len(), "Event consumer started");

            loop {
                tokio::select! {
                    result = receiver.recv() => {
                        match result {
                            Ok(event) => {
                                self.deliver(&event).await;
                            }
                            Err(broadcast::error::RecvError::Lagged(n)) => {
                                tracing::warn!(lagged = n, "Event consumer lagged");
                            }
                            Err(broadcast::error::RecvError::Closed) => {
                                tracing::info!("Event channel closed");
                                break;
                            }
                        }
                    }
                    _ = shutdown_rx.recv() => {
                        tracing::debug!("Event consumer shutting down");
                        break;
                    }
                }
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    use standards_core::domain::EntityKind;

    use crate::cache::MemoryEventBus;

    /// Counts calls and fails the first `failures` of them.
    #[derive(Clone, Default)]
    struct CountingHandler {
        calls: Arc<AtomicU32>,
        failures: Arc<AtomicU32>,
    }

    #[async_trait]
    impl EventHandler for CountingHandler {
        fn name(&self) -> &'static str {
            "counting"
        }

        async fn handle(&self, _event: &DomainEvent) -> anyhow::Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.failures.load(Ordering::SeqCst) > 0 {
                self.failures.fetch_sub(1, Ordering::SeqCst);
                anyhow::bail!("handler unavailable");
            }
            Ok(())
        }
    }

    fn consumer(bus: Arc<MemoryEventBus>, max_retries: u32) -> (EventConsumer, CountingHandler) {
        let handler = CountingHandler::default();
        let consumer = EventConsumer::new(bus, RetryPolicy::new(max_retries, Duration::from_millis(1)))
            .with_handler(handler.clone());
        (consumer, handler)
    }

    fn event() -> DomainEvent {
        DomainEvent::deleted(EntityKind::Position, Uuid::new_v4())
    }

    #[tokio::test]
    async fn test_duplicates_are_skipped() {
        let (consumer, handler) = consumer(Arc::new(MemoryEventBus::new()), 0);
        let event = event();

        assert_eq!(consumer.deliver(&event).await, Delivery::Handled);
        assert_eq!(consumer.deliver(&event).await, Delivery::Duplicate);
        assert_eq!(handler.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_handler_retried() {
        let (consumer, handler) = consumer(Arc::new(MemoryEventBus::new()), 2);
        handler.failures.store(2, Ordering::SeqCst);

        assert_eq!(consumer.deliver(&event()).await, Delivery::Handled);
        assert_eq!(handler.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_failed_event_is_not_remembered() {
        let (consumer, handler) = consumer(Arc::new(MemoryEventBus::new()), 0);
        handler.failures.store(1, Ordering::SeqCst);
        let event = event();

        assert_eq!(consumer.deliver(&event).await, Delivery::Failed);
        assert_eq!(consumer.deliver(&event).await, Delivery::Handled);
        assert_eq!(handler.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_spawned_consumer_handles_published_events() {
        let bus = Arc::new(MemoryEventBus::new());
        let (consumer, handler) = consumer(bus.clone(), 0);
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

        let handle = consumer.spawn(shutdown_rx).await.unwrap();
        bus.publish(DOMAIN_EVENTS_TOPIC, &event()).await.unwrap();

        for _ in 0..100 {
            if handler.calls.load(Ordering::SeqCst) == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(handler.calls.load(Ordering::SeqCst), 1);

        shutdown_tx.send(()).unwrap();
        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
