//! Background task draining the outbox.
//!
//! Every poll interval the worker fetches a batch of pending messages, oldest
//! first, and publishes each one on [`DOMAIN_EVENTS_TOPIC`]. A message that
//! still fails after the in-process retries is marked failed; once it has
//! failed `max_attempts` times it is dead-lettered and never picked up again.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::broadcast;
use tokio::time::MissedTickBehavior;

use standards_core::cache::{EventBus, DOMAIN_EVENTS_TOPIC};
use standards_core::events::OutboxMessage;
use standards_core::retry::RetryPolicy;
use standards_core::storage::{OutboxStore, RepositoryError};

use crate::config::Config;

/// Outcome of one poll.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutboxReport {
    pub published: usize,
    /// Failed but will be retried on a later poll.
    pub failed: usize,
    pub dead_lettered: usize,
}

impl OutboxReport {
    pub fn is_empty(&self) -> bool {
        self.published == 0 && self.failed == 0 && self.dead_lettered == 0
    }
}

pub struct OutboxWorker {
    store: Arc<dyn OutboxStore>,
    bus: Arc<dyn EventBus>,
    retry: RetryPolicy,
    poll_interval: Duration,
    batch_size: usize,
    max_attempts: u32,
}

impl OutboxWorker {
    pub fn new(store: Arc<dyn OutboxStore>, bus: Arc<dyn EventBus>, config: &Config) -> Self {
        Self {
            store,
            bus,
            retry: config.retry_policy(),
            poll_interval: config.outbox_poll_interval(),
            batch_size: config.outbox_batch_size.max(1),
            max_attempts: config.outbox_max_attempts.max(1),
        }
    }

    /// Processes one batch of pending messages.
    pub async fn run_once(&self) -> Result<OutboxReport, RepositoryError> {
        let messages = self.store.pending_messages(self.batch_size).await?;
        let mut report = OutboxReport::default();

        for message in messages {
            match self.publish(&message).await {
                Ok(()) => {
                    self.store.mark_processed(message.id(), Utc::now()).await?;
                    report.published += 1;
                    tracing::debug!(
                        event_id = %message.id(),
                        event_type = %message.event.event_type(),
                        "Published outbox message"
                    );
                }
                Err(error) => {
                    let retry = message.attempts + 1 < self.max_attempts;
                    self.store
                        .mark_failed(message.id(), &error.to_string(), retry)
                        .await?;
                    if retry {
                        report.failed += 1;
                        tracing::warn!(
                            event_id = %message.id(),
                            attempts = message.attempts + 1,
                            error = %error,
                            "Failed to publish outbox message"
                        );
                    } else {
                        report.dead_lettered += 1;
                        tracing::error!(
                            event_id = %message.id(),
                            attempts = message.attempts + 1,
                            error = %error,
                            "Outbox message dead-lettered"
                        );
                    }
                }
            }
        }

        Ok(report)
    }

    async fn publish(&self, message: &OutboxMessage) -> standards_core::cache::Result<()> {
        self.retry
            .run_notify(
                |_| self.bus.publish(DOMAIN_EVENTS_TOPIC, &message.event),
                |attempt, error, delay| {
                    tracing::debug!(
                        event_id = %message.id(),
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %error,
                        "Retrying publish"
                    );
                },
            )
            .await
    }

    /// Polls until a shutdown signal arrives.
    pub async fn run(self, mut shutdown_rx: broadcast::Receiver<()>) {
        let mut interval = tokio::time::interval(self.poll_interval.max(Duration::from_millis(1)));
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(
            poll_interval_ms = self.poll_interval.as_millis() as u64,
            batch_size = self.batch_size,
            "Outbox worker started"
        );

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    match self.run_once().await {
                        Ok(report) if !report.is_empty() => {
                            tracing::debug!(
                                published = report.published,
                                failed = report.failed,
                                dead_lettered = report.dead_lettered,
                                "Outbox batch processed"
                            );
                        }
                        Ok(_) => {}
                        Err(e) => tracing::warn!(error = %e, "Outbox poll failed"),
                    }
                }
                _ = shutdown_rx.recv() => {
                    tracing::info!("Outbox worker shutting down");
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    use async_trait::async_trait;
    use serde_json::json;
    use uuid::Uuid;

    use standards_core::cache::{CacheError, Result as CacheResult};
    use standards_core::domain::EntityKind;
    use standards_core::events::DomainEvent;
    use standards_core::storage::{Document, DocumentRepository};

    use crate::cache::MemoryEventBus;
    use crate::storage::InMemoryRepository;

    /// Bus that fails the first `failures` publishes.
    struct FlakyBus {
        inner: MemoryEventBus,
        failures: AtomicU32,
        calls: AtomicU32,
    }

    impl FlakyBus {
        fn new(failures: u32) -> Self {
            Self {
                inner: MemoryEventBus::new(),
                failures: AtomicU32::new(failures),
                calls: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl EventBus for FlakyBus {
        async fn publish(&self, topic: &str, event: &DomainEvent) -> CacheResult<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let remaining = self.failures.load(Ordering::SeqCst);
            if remaining > 0 {
                self.failures.store(remaining - 1, Ordering::SeqCst);
                return Err(CacheError::PublishFailed("broker unavailable".to_string()));
            }
            self.inner.publish(topic, event).await
        }

        async fn subscribe(&self, topic: &str) -> CacheResult<broadcast::Receiver<DomainEvent>> {
            self.inner.subscribe(topic).await
        }
    }

    fn config(max_retries: u32, max_attempts: u32) -> Config {
        Config {
            outbox_max_attempts: max_attempts,
            retry_max_retries: max_retries,
            retry_base_delay_ms: 1,
            outbox_poll_interval_ms: 10,
            ..Config::default()
        }
    }

    async fn write_document(repository: &InMemoryRepository) -> DomainEvent {
        let document = Document {
            kind: EntityKind::Grade,
            id: Uuid::new_v4(),
            fields: json!({"name": "First"}).as_object().cloned().unwrap_or_default(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let event = DomainEvent::created(document.kind, document.id, document.to_json());
        repository.create_document(&document, &event).await.unwrap();
        event
    }

    #[tokio::test]
    async fn test_publishes_pending_messages_in_order() {
        let repository = Arc::new(InMemoryRepository::new());
        let bus = Arc::new(MemoryEventBus::new());
        let mut rx = bus.subscribe(DOMAIN_EVENTS_TOPIC).await.unwrap();
        let first = write_document(&repository).await;
        let second = write_document(&repository).await;

        let worker = OutboxWorker::new(repository.clone(), bus, &config(0, 3));
        let report = worker.run_once().await.unwrap();

        assert_eq!(report.published, 2);
        assert_eq!(rx.recv().await.unwrap().id, first.id);
        assert_eq!(rx.recv().await.unwrap().id, second.id);
        assert_eq!(repository.count_pending().await.unwrap(), 0);
        assert!(worker.run_once().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_retries_within_one_poll() {
        let repository = Arc::new(InMemoryRepository::new());
        let bus = Arc::new(FlakyBus::new(2));
        write_document(&repository).await;

        let worker = OutboxWorker::new(repository.clone(), bus.clone(), &config(2, 3));
        let report = worker.run_once().await.unwrap();

        assert_eq!(report.published, 1);
        assert_eq!(bus.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_failed_message_stays_pending_until_dead_lettered() {
        let repository = Arc::new(InMemoryRepository::new());
        let bus = Arc::new(FlakyBus::new(u32::MAX));
        write_document(&repository).await;

        let worker = OutboxWorker::new(repository.clone(), bus, &config(0, 2));

        let report = worker.run_once().await.unwrap();
        assert_eq!(report.failed, 1);
        assert_eq!(repository.count_pending().await.unwrap(), 1);

        let report = worker.run_once().await.unwrap();
        assert_eq!(report.dead_lettered, 1);
        assert_eq!(repository.count_pending().await.unwrap(), 0);

        let messages = repository.outbox_messages().await;
        assert!(messages[0].dead);
        assert_eq!(messages[0].attempts, 2);
        assert_eq!(messages[0].last_error.as_deref(), Some("Publish failed: broker unavailable"));
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let repository = Arc::new(InMemoryRepository::new());
        let bus = Arc::new(MemoryEventBus::new());
        let mut rx = bus.subscribe(DOMAIN_EVENTS_TOPIC).await.unwrap();
        let event = write_document(&repository).await;

        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let worker = OutboxWorker::new(repository, bus, &config(0, 3));
        let handle = tokio::spawn(worker.run(shutdown_rx));

        let received = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(received.id, event.id);

        shutdown_tx.send(()).unwrap();
        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
