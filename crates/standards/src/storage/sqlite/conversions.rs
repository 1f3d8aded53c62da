//! SQLite row conversion functions.
//!
//! Pure functions between SQLite rows and storage types, testable without a
//! database.

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::Row;
use serde_json::{Map, Value};
use uuid::Uuid;

use standards_core::domain::EntityKind;
use standards_core::events::OutboxMessage;
use standards_core::storage::{format_timestamp, Document, RepositoryError, Result};

fn conversion_error<E>(column: usize) -> impl FnOnce(E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    move |e| rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(e))
}

fn parse_uuid(s: &str, column: usize) -> rusqlite::Result<Uuid> {
    Uuid::parse_str(s).map_err(conversion_error(column))
}

fn parse_datetime(s: &str, column: usize) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(conversion_error(column))
}

/// Convert a SQLite row to a Document.
///
/// Expected columns: kind, id, fields, created_at, updated_at
pub fn row_to_document(row: &Row) -> rusqlite::Result<Document> {
    let kind: String = row.get(0)?;
    let id: String = row.get(1)?;
    let fields: String = row.get(2)?;
    let created_at: String = row.get(3)?;
    let updated_at: String = row.get(4)?;

    Ok(Document {
        kind: kind.parse::<EntityKind>().map_err(conversion_error(0))?,
        id: parse_uuid(&id, 1)?,
        fields: serde_json::from_str::<Map<String, Value>>(&fields)
            .map_err(conversion_error(2))?,
        created_at: parse_datetime(&created_at, 3)?,
        updated_at: parse_datetime(&updated_at, 4)?,
    })
}

/// Convert a SQLite row to an OutboxMessage.
///
/// Expected columns: event, attempts, last_error, processed_at, dead
pub fn row_to_outbox_message(row: &Row) -> rusqlite::Result<OutboxMessage> {
    let event: String = row.get(0)?;
    let attempts: u32 = row.get(1)?;
    let last_error: Option<String> = row.get(2)?;
    let processed_at: Option<String> = row.get(3)?;
    let dead: bool = row.get(4)?;

    Ok(OutboxMessage {
        event: serde_json::from_str(&event).map_err(conversion_error(0))?,
        attempts,
        last_error,
        processed_at: processed_at
            .as_deref()
            .map(|s| parse_datetime(s, 3))
            .transpose()?,
        dead,
    })
}

/// Column values for `INSERT_DOCUMENT`/`UPDATE_DOCUMENT`.
pub struct DocumentRow {
    pub kind: String,
    pub id: String,
    pub fields: String,
    pub created_at: String,
    pub updated_at: String,
}

pub fn document_to_row(document: &Document) -> Result<DocumentRow> {
    Ok(DocumentRow {
        kind: document.kind.as_str().to_string(),
        id: document.id.to_string(),
        fields: serde_json::to_string(&document.fields)
            .map_err(|e| RepositoryError::Serialization(e.to_string()))?,
        created_at: format_timestamp(document.created_at),
        updated_at: format_timestamp(document.updated_at),
    })
}

/// JSON path of a top-level field. Field names are plain identifiers.
pub fn json_path(field: &str) -> String {
    format!("$.{field}")
}
