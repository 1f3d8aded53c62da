//! Navigation properties between entity kinds.
//!
//! A single static table drives eager loading, existence checks on write and
//! the delete restriction.

use serde_json::{Map, Value};
use uuid::Uuid;

use super::EntityKind;

/// A field on `from` that holds the id (or ids) of a `to` record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferenceField {
    pub from: EntityKind,
    pub field: &'static str,
    pub to: EntityKind,
    /// The field holds an array of ids instead of a single id.
    pub many: bool,
}

const fn one(from: EntityKind, field: &'static str, to: EntityKind) -> ReferenceField {
    ReferenceField {
        from,
        field,
        to,
        many: false,
    }
}

pub const REFERENCES: &[ReferenceField] = &[
    one(EntityKind::Sector, "department_id", EntityKind::Department),
    one(EntityKind::Person, "position_id", EntityKind::Position),
    one(EntityKind::Person, "sector_id", EntityKind::Sector),
    one(EntityKind::Person, "category_id", EntityKind::Category),
    one(EntityKind::Person, "grade_id", EntityKind::Grade),
    one(EntityKind::Floor, "housing_id", EntityKind::Housing),
    one(EntityKind::Room, "floor_id", EntityKind::Floor),
    one(EntityKind::Room, "sector_id", EntityKind::Sector),
    one(EntityKind::Workplace, "room_id", EntityKind::Room),
    one(EntityKind::Workplace, "responsible_person_id", EntityKind::Person),
    one(EntityKind::Unit, "quantity_id", EntityKind::Quantity),
    one(EntityKind::Characteristic, "standard_id", EntityKind::Standard),
    one(EntityKind::Characteristic, "unit_id", EntityKind::Unit),
    one(EntityKind::Material, "unit_id", EntityKind::Unit),
    one(EntityKind::Standard, "responsible_person_id", EntityKind::Person),
    one(EntityKind::Standard, "workplace_id", EntityKind::Workplace),
    one(EntityKind::Service, "standard_id", EntityKind::Standard),
    ReferenceField {
        from: EntityKind::Service,
        field: "material_ids",
        to: EntityKind::Material,
        many: true,
    },
    one(EntityKind::CalibrationJournalItem, "standard_id", EntityKind::Standard),
    one(EntityKind::VerificationJournalItem, "standard_id", EntityKind::Standard),
];

/// A resolved reference value found on a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub field: &'static str,
    pub to: EntityKind,
    pub id: Uuid,
}

/// Reference fields declared on `kind`.
pub fn reference_fields(kind: EntityKind) -> impl Iterator<Item = &'static ReferenceField> {
    REFERENCES.iter().filter(move |r| r.from == kind)
}

/// Reference fields on other kinds that point at `kind`.
pub fn dependents_of(kind: EntityKind) -> impl Iterator<Item = &'static ReferenceField> {
    REFERENCES.iter().filter(move |r| r.to == kind)
}

/// Extracts every non-null reference from a record's fields.
///
/// Values that are not valid UUIDs are skipped; deserialization into the
/// entity type rejects them before this is reached.
pub fn references_of(kind: EntityKind, fields: &Map<String, Value>) -> Vec<Reference> {
    let mut references = Vec::new();
    for reference in reference_fields(kind) {
        let ids: Vec<&Value> = match fields.get(reference.field) {
            Some(Value::Array(values)) if reference.many => values.iter().collect(),
            Some(value) if !reference.many => vec![value],
            _ => continue,
        };
        for id in ids.into_iter().filter_map(|v| v.as_str()) {
            if let Ok(id) = Uuid::parse_str(id) {
                references.push(Reference {
                    field: reference.field,
                    to: reference.to,
                    id,
                });
            }
        }
    }
    references
}
