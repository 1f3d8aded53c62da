//! In-memory repository implementation.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

use standards_core::domain::{EntityKind, ReferenceField};
use standards_core::events::{DomainEvent, OutboxMessage};
use standards_core::query::{self, Page, QueryParameters};
use standards_core::storage::{
    ensure_not_referenced, ensure_references_exist, Document, DocumentRepository, OutboxStore,
    RepositoryError, Result,
};

#[derive(Debug, Default)]
struct Store {
    documents: HashMap<EntityKind, HashMap<Uuid, Document>>,
    /// Insertion order is publication order.
    outbox: Vec<OutboxMessage>,
}

impl Store {
    fn kind(&self, kind: EntityKind) -> impl Iterator<Item = &Document> {
        self.documents.get(&kind).into_iter().flat_map(HashMap::values)
    }

    fn contains(&self, kind: EntityKind, id: Uuid) -> bool {
        self.documents
            .get(&kind)
            .is_some_and(|documents| documents.contains_key(&id))
    }

    fn count_references(&self, reference: &ReferenceField, id: Uuid) -> u64 {
        let id = id.to_string();
        self.kind(reference.from)
            .filter(|document| references(document, reference, &id))
            .count() as u64
    }
}

/// In-memory storage backend.
///
/// Documents and outbox messages share one lock, so a write and its event
/// become visible together. Data is lost when the repository is dropped.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRepository {
    store: Arc<RwLock<Store>>,
}

impl InMemoryRepository {
    /// Creates a new empty in-memory repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every outbox message, processed or not, oldest first.
    #[cfg(test)]
    pub async fn outbox_messages(&self) -> Vec<OutboxMessage> {
        self.store.read().await.outbox.clone()
    }
}

fn not_found(kind: EntityKind, id: Uuid) -> RepositoryError {
    RepositoryError::NotFound {
        entity_type: kind.display_name(),
        id: id.to_string(),
    }
}

fn references(document: &Document, reference: &ReferenceField, id: &str) -> bool {
    match document.fields.get(reference.field) {
        Some(Value::String(s)) if !reference.many => s == id,
        Some(Value::Array(items)) if reference.many => {
            items.iter().any(|item| item.as_str() == Some(id))
        }
        _ => false,
    }
}

#[async_trait]
impl DocumentRepository for InMemoryRepository {
    async fn get_document(&self, kind: EntityKind, id: Uuid) -> Result<Option<Document>> {
        let store = self.store.read().await;
        Ok(store
            .documents
            .get(&kind)
            .and_then(|documents| documents.get(&id))
            .cloned())
    }

    async fn list_documents(&self, kind: EntityKind) -> Result<Vec<Document>> {
        let store = self.store.read().await;
        let mut documents: Vec<Document> = store.kind(kind).cloned().collect();
        documents.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(documents)
    }

    async fn query_documents(
        &self,
        kind: EntityKind,
        params: &QueryParameters,
    ) -> Result<Page<Document>> {
        let documents: Vec<Document> = {
            let store = self.store.read().await;
            store.kind(kind).cloned().collect()
        };
        Ok(query::apply(documents, params, Document::view))
    }

    async fn create_document(&self, document: &Document, event: &DomainEvent) -> Result<()> {
        let mut store = self.store.write().await;
        if store.contains(document.kind, document.id) {
            return Err(RepositoryError::AlreadyExists {
                entity_type: document.kind.display_name(),
                id: document.id.to_string(),
            });
        }
        ensure_references_exist(document, |kind, id| Ok(store.contains(kind, id)))?;
        store
            .documents
            .entry(document.kind)
            .or_default()
            .insert(document.id, document.clone());
        store.outbox.push(OutboxMessage::new(event.clone()));
        Ok(())
    }

    async fn update_document(&self, document: &Document, event: &DomainEvent) -> Result<()> {
        let mut store = self.store.write().await;
        if !store.contains(document.kind, document.id) {
            return Err(not_found(document.kind, document.id));
        }
        ensure_references_exist(document, |kind, id| Ok(store.contains(kind, id)))?;
        let slot = store
            .documents
            .get_mut(&document.kind)
            .and_then(|documents| documents.get_mut(&document.id))
            .ok_or_else(|| not_found(document.kind, document.id))?;
        *slot = document.clone();
        store.outbox.push(OutboxMessage::new(event.clone()));
        Ok(())
    }

    async fn delete_document(
        &self,
        kind: EntityKind,
        id: Uuid,
        event: &DomainEvent,
    ) -> Result<()> {
        let mut store = self.store.write().await;
        if !store.contains(kind, id) {
            return Err(not_found(kind, id));
        }
        ensure_not_referenced(kind, id, |reference, id| {
            Ok(store.count_references(reference, id))
        })?;
        store
            .documents
            .get_mut(&kind)
            .and_then(|documents| documents.remove(&id))
            .ok_or_else(|| not_found(kind, id))?;
        store.outbox.push(OutboxMessage::new(event.clone()));
        Ok(())
    }
}

#[async_trait]
impl OutboxStore for InMemoryRepository {
    async fn pending_messages(&self, limit: usize) -> Result<Vec<OutboxMessage>> {
        let store = self.store.read().await;
        Ok(store
            .outbox
            .iter()
            .filter(|m| m.is_pending())
            .take(limit)
            .cloned()
            .collect())
    }

    async fn mark_processed(&self, id: Uuid, processed_at: DateTime<Utc>) -> Result<()> {
        let mut store = self.store.write().await;
        let message = store
            .outbox
            .iter_mut()
            .find(|m| m.id() == id)
            .ok_or_else(|| RepositoryError::NotFound {
                entity_type: "OutboxMessage",
                id: id.to_string(),
            })?;
        message.processed_at = Some(processed_at);
        Ok(())
    }

    async fn mark_failed(&self, id: Uuid, error: &str, retry: bool) -> Result<()> {
        let mut store = self.store.write().await;
        let message = store
            .outbox
            .iter_mut()
            .find(|m| m.id() == id)
            .ok_or_else(|| RepositoryError::NotFound {
                entity_type: "OutboxMessage",
                id: id.to_string(),
            })?;
        message.record_failure(error, retry);
        Ok(())
    }

    async fn count_pending(&self) -> Result<u64> {
        let store = self.store.read().await;
        Ok(store.outbox.iter().filter(|m| m.is_pending()).count() as u64)
    }
}
