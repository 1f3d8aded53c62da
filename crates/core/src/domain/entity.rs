use chrono::{DateTime, SubsecRound, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::{EntityKind, ValidationErrors};

/// The data part of a stored record.
///
/// Implementors are plain structs; identity and timestamps live on
/// [`Record`].
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const KIND: EntityKind;

    /// Checks the record's own invariants. References to other records are
    /// checked by the service, which can see storage.
    fn validate(&self) -> Result<(), ValidationErrors>;
}

/// A stored entity with identity and audit timestamps.
///
/// Serializes flat: `{"id": .., <entity fields>, "created_at": .., "updated_at": ..}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record<E> {
    pub id: Uuid,
    #[serde(flatten)]
    pub data: E,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The current time at the microsecond precision storage keeps.
fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

impl<E: Entity> Record<E> {
    /// Creates a new record with a fresh id.
    pub fn new(data: E) -> Self {
        let now = now();
        Self {
            id: Uuid::new_v4(),
            data,
            created_at: now,
            updated_at: now,
        }
    }

    /// Sets a specific ID for this record (useful for seeding and tests).
    pub fn with_id(mut self, id: Uuid) -> Self {
        self.id = id;
        self
    }

    /// Replaces the data, keeping identity and `created_at`.
    pub fn revise(&self, data: E) -> Self {
        Self {
            id: self.id,
            data,
            created_at: self.created_at,
            updated_at: now().max(self.created_at),
        }
    }
}

/// Applies an RFC 7396 JSON merge patch to `target`.
///
/// Objects merge recursively, `null` removes a member, anything else replaces.
pub fn merge_patch(target: &mut Value, patch: &Value) {
    let Value::Object(patch_map) = patch else {
        *target = patch.clone();
        return;
    };

    if !target.is_object() {
        *target = Value::Object(serde_json::Map::new());
    }

    if let Value::Object(target_map) = target {
        for (key, value) in patch_map {
            if value.is_null() {
                target_map.remove(key);
            } else {
                merge_patch(
                    target_map.entry(key.clone()).or_insert(Value::Null),
                    value,
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Housing;
    use serde_json::json;

    #[test]
    fn test_record_serializes_flat() {
        let record = Record::new(Housing::new("Main building", "MB", "1 Lenin St", 4))
            .with_id(Uuid::nil());
        let value = serde_json::to_value(&record).unwrap();

        assert_eq!(value["id"], json!("00000000-0000-0000-0000-000000000000"));
        assert_eq!(value["name"], json!("Main building"));
        assert_eq!(value["floors_count"], json!(4));
        assert!(value.get("data").is_none());
        assert!(value.get("created_at").is_some());
    }

    #[test]
    fn test_timestamps_have_microsecond_precision() {
        let record = Record::new(Housing::new("Main building", "MB", "1 Lenin St", 4));
        assert_eq!(record.created_at.timestamp_subsec_nanos() % 1_000, 0);

        let revised = record.revise(Housing::new("Annex", "AX", "1 Lenin St", 2));
        assert_eq!(revised.updated_at.timestamp_subsec_nanos() % 1_000, 0);
        assert!(revised.updated_at >= revised.created_at);
    }

    #[test]
    fn test_record_deserializes_flat() {
        let value = json!({
            "id": "00000000-0000-0000-0000-000000000000",
            "name": "Lab",
            "short_name": "L",
            "address": "2 Lenin St",
            "floors_count": 2,
            "comments": null,
            "created_at": "2024-06-15T10:30:00Z",
            "updated_at": "2024-06-15T10:30:00Z"
        });
        let record: Record<Housing> = serde_json::from_value(value).unwrap();
        assert_eq!(record.data.name, "Lab");
        assert_eq!(record.data.floors_count, 2);
    }

    #[test]
    fn test_revise_keeps_identity() {
        let record = Record::new(Housing::new("Old", "O", "Somewhere", 1));
        let revised = record.revise(Housing::new("New", "N", "Somewhere", 2));

        assert_eq!(revised.id, record.id);
        assert_eq!(revised.created_at, record.created_at);
        assert!(revised.updated_at >= record.updated_at);
        assert_eq!(revised.data.name, "New");
    }

    #[test]
    fn test_merge_patch_replaces_and_removes() {
        let mut target = json!({"name": "Room 1", "comments": "old", "length": 4.0});
        merge_patch(&mut target, &json!({"name": "Room 2", "comments": null}));
        assert_eq!(target, json!({"name": "Room 2", "length": 4.0}));
    }

    #[test]
    fn test_merge_patch_nested_objects() {
        let mut target = json!({"a": {"b": 1, "c": 2}});
        merge_patch(&mut target, &json!({"a": {"c": null, "d": 3}}));
        assert_eq!(target, json!({"a": {"b": 1, "d": 3}}));
    }

    #[test]
    fn test_merge_patch_non_object_replaces() {
        let mut target = json!({"a": 1});
        merge_patch(&mut target, &json!([1, 2]));
        assert_eq!(target, json!([1, 2]));
    }
}
