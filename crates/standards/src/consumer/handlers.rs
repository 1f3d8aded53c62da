use async_trait::async_trait;

use standards_core::events::DomainEvent;

use super::EventHandler;
use crate::cache::CacheService;
use crate::history::EventHistory;

/// Drops cached entries of the event's kind.
///
/// Writes already invalidate the local cache; this keeps caches of other
/// instances sharing the bus coherent.
pub struct CacheInvalidationHandler {
    cache: CacheService,
}

impl CacheInvalidationHandler {
    pub fn new(cache: CacheService) -> Self {
        Self { cache }
    }
}

#[async_trait]
impl EventHandler for CacheInvalidationHandler {
    fn name(&self) -> &'static str {
        "cache_invalidation"
    }

    async fn handle(&self, event: &DomainEvent) -> anyhow::Result<()> {
        self.cache
            .invalidate_kind(event.kind, Some(event.entity_id))
            .await;
        Ok(())
    }
}

/// Appends events to the SSE history.
pub struct EventHistoryHandler {
    history: EventHistory,
}

impl EventHistoryHandler {
    pub fn new(history: EventHistory) -> Self {
        Self { history }
    }
}

#[async_trait]
impl EventHandler for EventHistoryHandler {
    fn name(&self) -> &'static str {
        "event_history"
    }

    async fn handle(&self, event: &DomainEvent) -> anyhow::Result<()> {
        self.history.push(event.clone());
        Ok(())
    }
}
