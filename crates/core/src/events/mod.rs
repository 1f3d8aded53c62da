//! Domain events raised by writes and the outbox rows that carry them.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::domain::EntityKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventAction {
    Created,
    Updated,
    Deleted,
}

impl EventAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventAction::Created => "created",
            EventAction::Updated => "updated",
            EventAction::Deleted => "deleted",
        }
    }
}

impl fmt::Display for EventAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Something that happened to one record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainEvent {
    pub id: Uuid,
    pub kind: EntityKind,
    pub entity_id: Uuid,
    pub action: EventAction,
    /// The record after the change; `None` for deletions.
    pub payload: Option<Value>,
    pub occurred_at: DateTime<Utc>,
}

impl DomainEvent {
    fn new(kind: EntityKind, entity_id: Uuid, action: EventAction, payload: Option<Value>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            entity_id,
            action,
            payload,
            occurred_at: Utc::now(),
        }
    }

    pub fn created(kind: EntityKind, entity_id: Uuid, payload: Value) -> Self {
        Self::new(kind, entity_id, EventAction::Created, Some(payload))
    }

    pub fn updated(kind: EntityKind, entity_id: Uuid, payload: Value) -> Self {
        Self::new(kind, entity_id, EventAction::Updated, Some(payload))
    }

    pub fn deleted(kind: EntityKind, entity_id: Uuid) -> Self {
        Self::new(kind, entity_id, EventAction::Deleted, None)
    }

    /// Event name used on the wire, e.g. `"room.created"`.
    pub fn event_type(&self) -> String {
        format!("{}.{}", self.kind, self.action)
    }
}

/// A persisted event waiting to be published.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboxMessage {
    pub event: DomainEvent,
    pub attempts: u32,
    pub last_error: Option<String>,
    pub processed_at: Option<DateTime<Utc>>,
    /// Gave up after too many failed attempts.
    pub dead: bool,
}

impl OutboxMessage {
    pub fn new(event: DomainEvent) -> Self {
        Self {
            event,
            attempts: 0,
            last_error: None,
            processed_at: None,
            dead: false,
        }
    }

    pub fn id(&self) -> Uuid {
        self.event.id
    }

    pub fn is_pending(&self) -> bool {
        self.processed_at.is_none() && !self.dead
    }

    /// Records a failed publish attempt. `retry == false` dead-letters the message.
    pub fn record_failure(&mut self, error: &str, retry: bool) {
        self.attempts += 1;
        self.last_error = Some(error.to_string());
        self.dead = !retry;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_event_type() {
        let event = DomainEvent::created(EntityKind::Room, Uuid::nil(), json!({}));
        assert_eq!(event.event_type(), "room.created");
        let event = DomainEvent::deleted(EntityKind::CalibrationJournalItem, Uuid::nil());
        assert_eq!(event.event_type(), "calibration_journal_item.deleted");
        assert!(event.payload.is_none());
    }

    #[test]
    fn test_event_serialization_shape() {
        let event = DomainEvent::updated(EntityKind::Floor, Uuid::nil(), json!({"number": 2}));
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["kind"], "floor");
        assert_eq!(value["action"], "updated");
        assert_eq!(value["payload"]["number"], 2);
    }

    #[test]
    fn test_outbox_message_failure_tracking() {
        let mut message = OutboxMessage::new(DomainEvent::deleted(EntityKind::Unit, Uuid::nil()));
        assert!(message.is_pending());

        message.record_failure("broker down", true);
        assert_eq!(message.attempts, 1);
        assert!(message.is_pending());

        message.record_failure("broker down", false);
        assert_eq!(message.attempts, 2);
        assert!(!message.is_pending());
        assert_eq!(message.last_error.as_deref(), Some("broker down"));
    }
}
