//! Generic CRUD pipeline shared by every entity kind.
//!
//! Writes validate the payload, check that referenced records exist, then
//! persist the document together with its domain event. The storage repeats
//! the reference checks inside the write itself, so a record deleted in
//! between still fails the write, and deletes are refused while other
//! records point at the target.

use std::marker::PhantomData;
use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;
use uuid::Uuid;

use standards_core::domain::{
    merge_patch, reference_fields, references_of, Entity, Record, ValidationErrors,
};
use standards_core::events::DomainEvent;
use standards_core::query::{Page, QueryParameters};
use standards_core::storage::{Document, DocumentRepository, RepositoryError};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

pub type Result<T> = std::result::Result<T, ServiceError>;

/// A record with the records its reference fields point at.
///
/// Single references map to the referenced record or `null` when it is
/// missing; array references map to the records that still exist.
#[derive(Debug, Clone, Serialize)]
pub struct RecordDetails<E> {
    #[serde(flatten)]
    pub record: Record<E>,
    pub references: Map<String, Value>,
}

/// CRUD operations for one entity type.
pub struct EntityService<E> {
    repository: Arc<dyn DocumentRepository>,
    entity: PhantomData<fn() -> E>,
}

impl<E: Entity> EntityService<E> {
    pub fn new(repository: Arc<dyn DocumentRepository>) -> Self {
        Self {
            repository,
            entity: PhantomData,
        }
    }

    fn not_found(id: Uuid) -> ServiceError {
        RepositoryError::NotFound {
            entity_type: E::KIND.display_name(),
            id: id.to_string(),
        }
        .into()
    }

    /// Every record of this kind, oldest first.
    pub async fn get_all(&self) -> Result<Vec<Record<E>>> {
        let documents = self.repository.list_documents(E::KIND).await?;
        Ok(documents
            .into_iter()
            .map(Document::into_record)
            .collect::<std::result::Result<_, _>>()?)
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Record<E>> {
        let document = self
            .repository
            .get_document(E::KIND, id)
            .await?
            .ok_or_else(|| Self::not_found(id))?;
        Ok(document.into_record()?)
    }

    pub async fn search(&self, params: &QueryParameters) -> Result<Page<Record<E>>> {
        let page = self.repository.query_documents(E::KIND, params).await?;
        Ok(page.try_map(Document::into_record)?)
    }

    /// The record plus its referenced records (eager loading).
    pub async fn details(&self, id: Uuid) -> Result<RecordDetails<E>> {
        let document = self
            .repository
            .get_document(E::KIND, id)
            .await?
            .ok_or_else(|| Self::not_found(id))?;

        let mut references = Map::new();
        for field in reference_fields(E::KIND) {
            let empty = if field.many {
                Value::Array(Vec::new())
            } else {
                Value::Null
            };
            references.insert(field.field.to_string(), empty);
        }

        for reference in references_of(E::KIND, &document.fields) {
            let Some(target) = self.repository.get_document(reference.to, reference.id).await?
            else {
                continue;
            };
            match references.get_mut(reference.field) {
                Some(Value::Array(items)) => items.push(target.to_json()),
                Some(slot) => *slot = target.to_json(),
                None => {}
            }
        }

        Ok(RecordDetails {
            record: document.into_record()?,
            references,
        })
    }

    pub async fn create(&self, data: E) -> Result<Record<E>> {
        self.check(&data).await?;

        let record = Record::new(data);
        let document = Document::from_record(&record)?;
        let event = DomainEvent::created(E::KIND, record.id, document.to_json());
        self.repository
            .create_document(&document, &event)
            .await
            .map_err(reference_error)?;

        tracing::info!(kind = %E::KIND, id = %record.id, "Created record");
        Ok(record)
    }

    /// Replaces the record's data, keeping `created_at`.
    pub async fn edit(&self, id: Uuid, data: E) -> Result<Record<E>> {
        let existing = self.get_by_id(id).await?;
        self.replace(&existing, data).await
    }

    /// Applies a JSON merge patch to the record's current data.
    pub async fn patch(&self, id: Uuid, patch: &Value) -> Result<Record<E>> {
        let existing = self.get_by_id(id).await?;

        let mut data = serde_json::to_value(&existing.data)
            .map_err(|e| RepositoryError::Serialization(e.to_string()))?;
        merge_patch(&mut data, patch);
        let data: E = serde_json::from_value(data)
            .map_err(|e| ValidationErrors::single("body", e.to_string()))?;

        self.replace(&existing, data).await
    }

    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let event = DomainEvent::deleted(E::KIND, id);
        self.repository.delete_document(E::KIND, id, &event).await?;

        tracing::info!(kind = %E::KIND, id = %id, "Deleted record");
        Ok(())
    }

    async fn replace(&self, existing: &Record<E>, data: E) -> Result<Record<E>> {
        self.check(&data).await?;

        let record = existing.revise(data);
        let document = Document::from_record(&record)?;
        let event = DomainEvent::updated(E::KIND, record.id, document.to_json());
        self.repository
            .update_document(&document, &event)
            .await
            .map_err(reference_error)?;

        tracing::info!(kind = %E::KIND, id = %record.id, "Updated record");
        Ok(record)
    }

    /// Entity rules plus existence of every referenced record.
    async fn check(&self, data: &E) -> Result<()> {
        let mut errors = match data.validate() {
            Ok(()) => ValidationErrors::default(),
            Err(errors) => errors,
        };

        let fields = match serde_json::to_value(data) {
            Ok(Value::Object(fields)) => fields,
            Ok(_) => Map::new(),
            Err(e) => return Err(RepositoryError::Serialization(e.to_string()).into()),
        };
        for reference in references_of(E::KIND, &fields) {
            if self
                .repository
                .get_document(reference.to, reference.id)
                .await?
                .is_none()
            {
                errors.merge(ValidationErrors::single(
                    reference.field,
                    format!("{} {} does not exist", reference.to.display_name(), reference.id),
                ));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors.into())
        }
    }
}

/// Reports a reference that vanished after the pre-write check the same way
/// as one that never existed.
fn reference_error(error: RepositoryError) -> ServiceError {
    match &error {
        RepositoryError::MissingReference { field, .. } => {
            ValidationErrors::single(*field, error.to_string()).into()
        }
        _ => error.into(),
    }
}
