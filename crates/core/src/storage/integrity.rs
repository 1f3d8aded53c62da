//! Referential integrity rules shared by the storage backends.
//!
//! Backends call these while holding the lock or transaction of the write
//! they guard, passing lookups that read the same state.

use uuid::Uuid;

use crate::domain::{dependents_of, references_of, EntityKind, ReferenceField};

use super::{Document, RepositoryError, Result};

/// Fails with `MissingReference` on the first reference of `document` for
/// which `exists` returns false.
pub fn ensure_references_exist<F>(document: &Document, mut exists: F) -> Result<()>
where
    F: FnMut(EntityKind, Uuid) -> Result<bool>,
{
    for reference in references_of(document.kind, &document.fields) {
        if !exists(reference.to, reference.id)? {
            return Err(RepositoryError::MissingReference {
                field: reference.field,
                entity_type: reference.to.display_name(),
                id: reference.id.to_string(),
            });
        }
    }
    Ok(())
}

/// Fails with `InUse` when `count` finds documents pointing at `kind`/`id`.
pub fn ensure_not_referenced<F>(kind: EntityKind, id: Uuid, mut count: F) -> Result<()>
where
    F: FnMut(&ReferenceField, Uuid) -> Result<u64>,
{
    for dependent in dependents_of(kind) {
        let count = count(dependent, id)?;
        if count > 0 {
            return Err(RepositoryError::InUse {
                entity_type: kind.display_name(),
                id: id.to_string(),
                referenced_by: dependent.from.display_name(),
                count,
            });
        }
    }
    Ok(())
}
