//! Numbered event history for SSE replay.
//!
//! Every event handed to [`EventHistory::push`] gets a monotonically
//! increasing id, is kept in a bounded ring and is broadcast to live SSE
//! streams. Clients reconnect with the last id they saw and get the events
//! they missed, as long as those are still in the ring.

use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, RwLock,
    },
};

use serde::Serialize;
use tokio::sync::broadcast;

use standards_core::domain::EntityKind;
use standards_core::events::DomainEvent;

/// Capacity of the live channel; slow SSE clients past this lag and skip.
const LIVE_CHANNEL_CAPACITY: usize = 256;

/// A stored event with its ID for replay on reconnection.
#[derive(Clone, Debug, Serialize)]
pub struct StoredEvent {
    pub id: u64,
    pub event: DomainEvent,
}

#[derive(Clone, Debug)]
pub struct EventHistory {
    counter: Arc<AtomicU64>,
    events: Arc<RwLock<VecDeque<StoredEvent>>>,
    max_size: usize,
    live_tx: broadcast::Sender<StoredEvent>,
}

impl EventHistory {
    pub fn new(max_size: usize) -> Self {
        let (live_tx, _) = broadcast::channel(LIVE_CHANNEL_CAPACITY);
        Self {
            counter: Arc::new(AtomicU64::new(1)),
            events: Arc::new(RwLock::new(VecDeque::new())),
            max_size,
            live_tx,
        }
    }

    /// Stores the event and notifies live subscribers. Returns its id.
    pub fn push(&self, event: DomainEvent) -> u64 {
        let id = self.counter.fetch_add(1, Ordering::SeqCst);
        let stored = StoredEvent { id, event };

        tracing::trace!(event_id = id, event_type = %stored.event.event_type(), "Storing event in history");

        if let Ok(mut history) = self.events.write() {
            history.push_back(stored.clone());
            while history.len() > self.max_size {
                history.pop_front();
            }
        }

        let _ = self.live_tx.send(stored);
        id
    }

    /// Events after `since_id`, optionally limited to one kind.
    pub fn since(&self, kind: Option<EntityKind>, since_id: u64) -> Vec<StoredEvent> {
        self.events
            .read()
            .ok()
            .map(|history| {
                history
                    .iter()
                    .filter(|e| e.id > since_id && kind.is_none_or(|k| e.event.kind == k))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Oldest id still in the history, 0 when empty.
    pub fn oldest_id(&self) -> u64 {
        self.events
            .read()
            .ok()
            .and_then(|h| h.front().map(|e| e.id))
            .unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.events.read().map(|h| h.len()).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoredEvent> {
        self.live_tx.subscribe()
    }
}
