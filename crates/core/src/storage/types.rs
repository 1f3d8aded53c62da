use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::domain::{Entity, EntityKind, Record};

use super::{RepositoryError, Result};

/// A stored record with its entity data kept as JSON.
///
/// Backends store every kind the same way; [`Document::into_record`] turns a
/// document back into a typed [`Record`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub kind: EntityKind,
    pub id: Uuid,
    pub fields: Map<String, Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document {
    pub fn from_record<E: Entity>(record: &Record<E>) -> Result<Self> {
        let fields = match serde_json::to_value(&record.data) {
            Ok(Value::Object(fields)) => fields,
            Ok(other) => {
                return Err(RepositoryError::Serialization(format!(
                    "{} did not serialize to an object: {other}",
                    E::KIND.display_name()
                )))
            }
            Err(e) => return Err(RepositoryError::Serialization(e.to_string())),
        };
        Ok(Self {
            kind: E::KIND,
            id: record.id,
            fields,
            created_at: record.created_at,
            updated_at: record.updated_at,
        })
    }

    pub fn into_record<E: Entity>(self) -> Result<Record<E>> {
        if self.kind != E::KIND {
            return Err(RepositoryError::InvalidData(format!(
                "expected {} but document {} is a {}",
                E::KIND.display_name(),
                self.id,
                self.kind.display_name()
            )));
        }
        let data = serde_json::from_value(Value::Object(self.fields))
            .map_err(|e| RepositoryError::Serialization(e.to_string()))?;
        Ok(Record {
            id: self.id,
            data,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }

    /// Flattened view used by queries and the wire format:
    /// `id`, the entity fields, `created_at`, `updated_at`.
    pub fn view(&self) -> Map<String, Value> {
        let mut view = self.fields.clone();
        view.insert("id".to_string(), Value::String(self.id.to_string()));
        view.insert(
            "created_at".to_string(),
            Value::String(format_timestamp(self.created_at)),
        );
        view.insert(
            "updated_at".to_string(),
            Value::String(format_timestamp(self.updated_at)),
        );
        view
    }

    pub fn to_json(&self) -> Value {
        Value::Object(self.view())
    }
}

/// Fixed-width RFC 3339 timestamp, so text order equals time order.
pub fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parses a timestamp written by [`format_timestamp`] (or any RFC 3339 text).
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::InvalidData(format!("invalid timestamp {s:?}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Floor, Housing};
    use chrono::TimeZone;

    fn fixed_timestamp() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 10, 30, 0).unwrap()
    }

    fn housing_record() -> Record<Housing> {
        Record {
            id: Uuid::nil(),
            data: Housing::new("Main", "M", "1 Main St", 3),
            created_at: fixed_timestamp(),
            updated_at: fixed_timestamp(),
        }
    }

    #[test]
    fn test_record_document_round_trip() {
        let record = housing_record();
        let document = Document::from_record(&record).unwrap();
        assert_eq!(document.kind, EntityKind::Housing);
        assert_eq!(document.fields["name"], "Main");

        let back: Record<Housing> = document.into_record().unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_into_record_checks_kind() {
        let document = Document::from_record(&housing_record()).unwrap();
        let err = document.into_record::<Floor>().unwrap_err();
        assert!(matches!(err, RepositoryError::InvalidData(_)));
    }

    #[test]
    fn test_view_is_flat() {
        let document = Document::from_record(&housing_record()).unwrap();
        let view = document.view();
        assert_eq!(view["id"], "00000000-0000-0000-0000-000000000000");
        assert_eq!(view["created_at"], "2024-06-15T10:30:00.000000Z");
        assert_eq!(view["floors_count"], 3);
    }

    #[test]
    fn test_timestamps_sort_as_text() {
        let earlier = fixed_timestamp();
        let later = earlier + chrono::Duration::milliseconds(500);
        assert!(format_timestamp(earlier) < format_timestamp(later));
        assert_eq!(parse_timestamp(&format_timestamp(later)).unwrap(), later);
    }

    #[test]
    fn test_parse_timestamp_invalid() {
        assert!(matches!(
            parse_timestamp("yesterday"),
            Err(RepositoryError::InvalidData(_))
        ));
    }
}
