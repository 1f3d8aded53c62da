use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::EntityKind;
use crate::events::{DomainEvent, OutboxMessage};
use crate::query::{Page, QueryParameters};

use super::{Document, Result};

/// Storage for every entity kind.
///
/// Writes take the domain event describing the change; implementations must
/// persist the event to the outbox atomically with the document change.
/// Referential integrity is checked inside that same atomic write, with
/// [`ensure_references_exist`](super::ensure_references_exist) and
/// [`ensure_not_referenced`](super::ensure_not_referenced).
#[async_trait]
pub trait DocumentRepository: Send + Sync {
    /// Gets a document by kind and ID.
    async fn get_document(&self, kind: EntityKind, id: Uuid) -> Result<Option<Document>>;

    /// Gets every document of a kind, oldest first.
    async fn list_documents(&self, kind: EntityKind) -> Result<Vec<Document>>;

    /// Filters, sorts and pages the documents of a kind.
    async fn query_documents(
        &self,
        kind: EntityKind,
        params: &QueryParameters,
    ) -> Result<Page<Document>>;

    /// Creates a document. Fails with `AlreadyExists` if the ID is taken and
    /// with `MissingReference` if a reference field points at nothing.
    async fn create_document(&self, document: &Document, event: &DomainEvent) -> Result<()>;

    /// Replaces a document. Fails with `NotFound` if it does not exist and
    /// with `MissingReference` if a reference field points at nothing.
    async fn update_document(&self, document: &Document, event: &DomainEvent) -> Result<()>;

    /// Deletes a document. Fails with `NotFound` if it does not exist and
    /// with `InUse` while another document still references it.
    async fn delete_document(&self, kind: EntityKind, id: Uuid, event: &DomainEvent)
        -> Result<()>;
}

/// The outbox side of the storage: events waiting to be published.
#[async_trait]
pub trait OutboxStore: Send + Sync {
    /// Returns up to `limit` unprocessed, non-dead messages, oldest first.
    async fn pending_messages(&self, limit: usize) -> Result<Vec<OutboxMessage>>;

    /// Marks a message as published.
    async fn mark_processed(&self, id: Uuid, processed_at: DateTime<Utc>) -> Result<()>;

    /// Records a failed publish. With `retry == false` the message is dead-lettered.
    async fn mark_failed(&self, id: Uuid, error: &str, retry: bool) -> Result<()>;

    /// Number of messages still waiting to be published.
    async fn count_pending(&self) -> Result<u64>;
}
