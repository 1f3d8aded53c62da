//! SQLite repository implementation.
//!
//! Implements `DocumentRepository` and `OutboxStore` on one connection.
//! Each write and its outbox message commit in a single transaction.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio_rusqlite::Connection;
use uuid::Uuid;

use standards_core::domain::{EntityKind, ReferenceField};
use standards_core::events::{DomainEvent, OutboxMessage};
use standards_core::query::{Page, QueryParameters};
use standards_core::storage::{
    ensure_not_referenced, ensure_references_exist, format_timestamp, Document,
    DocumentRepository, OutboxStore, RepositoryError, Result,
};

use super::conversions::{document_to_row, json_path, row_to_document, row_to_outbox_message};
use super::error::{map_tokio_rusqlite_error, map_tokio_rusqlite_error_with_id};
use super::query::compile;
use super::schema;

/// Helper to wrap rusqlite errors for tokio_rusqlite closures.
fn wrap_err(e: rusqlite::Error) -> tokio_rusqlite::Error {
    tokio_rusqlite::Error::Rusqlite(e)
}

fn query_failed(e: rusqlite::Error) -> RepositoryError {
    RepositoryError::QueryFailed(e.to_string())
}

fn document_exists(conn: &rusqlite::Connection, kind: EntityKind, id: Uuid) -> Result<bool> {
    conn.query_row(
        schema::DOCUMENT_EXISTS,
        [kind.as_str(), id.to_string().as_str()],
        |row| row.get(0),
    )
    .map_err(query_failed)
}

/// Counts documents of `reference.from` whose `reference.field` points at `id`.
fn count_references(
    conn: &rusqlite::Connection,
    reference: &ReferenceField,
    id: Uuid,
) -> Result<u64> {
    let sql = if reference.many {
        schema::COUNT_MANY_REFERENCES
    } else {
        schema::COUNT_SINGLE_REFERENCES
    };
    let path = json_path(reference.field);
    let count: i64 = conn
        .query_row(
            sql,
            [reference.from.as_str(), path.as_str(), id.to_string().as_str()],
            |row| row.get(0),
        )
        .map_err(query_failed)?;
    Ok(u64::try_from(count).unwrap_or(0))
}

fn ensure_exists(conn: &rusqlite::Connection, kind: EntityKind, id: Uuid) -> Result<()> {
    if document_exists(conn, kind, id)? {
        Ok(())
    } else {
        Err(RepositoryError::NotFound {
            entity_type: kind.display_name(),
            id: id.to_string(),
        })
    }
}

/// Outbox row values for `INSERT_OUTBOX_MESSAGE`.
struct OutboxRow {
    id: String,
    event: String,
    occurred_at: String,
}

impl OutboxRow {
    fn new(event: &DomainEvent) -> Result<Self> {
        Ok(Self {
            id: event.id.to_string(),
            event: serde_json::to_string(event)
                .map_err(|e| RepositoryError::Serialization(e.to_string()))?,
            occurred_at: format_timestamp(event.occurred_at),
        })
    }

    fn insert(&self, tx: &rusqlite::Transaction<'_>) -> rusqlite::Result<()> {
        tx.execute(
            schema::INSERT_OUTBOX_MESSAGE,
            rusqlite::params![self.id, self.event, self.occurred_at],
        )?;
        Ok(())
    }
}

/// SQLite-based repository implementation.
pub struct SqliteRepository {
    conn: Connection,
}

impl SqliteRepository {
    /// Creates a new repository with a file-based database.
    ///
    /// The database file will be created if it doesn't exist.
    /// Schema tables are created automatically.
    pub async fn new(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .await
            .map_err(|e| RepositoryError::ConnectionFailed(e.to_string()))?;

        Self::init_schema(&conn).await?;

        Ok(Self { conn })
    }

    /// Creates a new repository with an in-memory database.
    pub async fn new_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| RepositoryError::ConnectionFailed(e.to_string()))?;

        Self::init_schema(&conn).await?;

        Ok(Self { conn })
    }

    async fn init_schema(conn: &Connection) -> Result<()> {
        conn.call(|conn| {
            conn.execute_batch(schema::CREATE_TABLES).map_err(wrap_err)?;
            Ok(())
        })
        .await
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))
    }

    /// Runs `guard`, then `write`, then inserts the outbox message, all in
    /// one transaction. `write` returns the number of affected document rows;
    /// zero means the document did not exist.
    async fn write_with_event<G, F>(
        &self,
        kind: EntityKind,
        id: Uuid,
        event: &DomainEvent,
        guard: G,
        write: F,
    ) -> Result<()>
    where
        G: FnOnce(&rusqlite::Connection) -> Result<()> + Send + 'static,
        F: FnOnce(&rusqlite::Transaction<'_>) -> rusqlite::Result<usize> + Send + 'static,
    {
        let outbox = OutboxRow::new(event)?;

        self.conn
            .call(move |conn| {
                let tx = conn.transaction().map_err(wrap_err)?;
                guard(&tx).map_err(|e| tokio_rusqlite::Error::Other(Box::new(e)))?;
                if write(&tx).map_err(wrap_err)? == 0 {
                    return Err(wrap_err(rusqlite::Error::QueryReturnedNoRows));
                }
                outbox.insert(&tx).map_err(wrap_err)?;
                tx.commit().map_err(wrap_err)?;
                Ok(())
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error_with_id(e, kind.display_name(), id.to_string()))
    }
}

#[async_trait]
impl DocumentRepository for SqliteRepository {
    async fn get_document(&self, kind: EntityKind, id: Uuid) -> Result<Option<Document>> {
        let kind_str = kind.as_str();
        let id_str = id.to_string();

        self.conn
            .call(move |conn| {
                let mut stmt = conn.prepare(schema::SELECT_DOCUMENT).map_err(wrap_err)?;
                match stmt.query_row([kind_str, id_str.as_str()], row_to_document) {
                    Ok(document) => Ok(Some(document)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(wrap_err(e)),
                }
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error_with_id(e, kind.display_name(), id.to_string()))
    }

    async fn list_documents(&self, kind: EntityKind) -> Result<Vec<Document>> {
        let kind_str = kind.as_str();

        self.conn
            .call(move |conn| {
                let mut stmt = conn
                    .prepare(schema::SELECT_DOCUMENTS_BY_KIND)
                    .map_err(wrap_err)?;
                let rows = stmt
                    .query_map([kind_str], row_to_document)
                    .map_err(wrap_err)?;

                let mut documents = Vec::new();
                for row_result in rows {
                    documents.push(row_result.map_err(wrap_err)?);
                }
                Ok(documents)
            })
            .await
            .map_err(map_tokio_rusqlite_error)
    }

    async fn query_documents(
        &self,
        kind: EntityKind,
        params: &QueryParameters,
    ) -> Result<Page<Document>> {
        let compiled = compile(kind, params);

        let (documents, total) = self
            .conn
            .call(move |conn| {
                let total: i64 = conn
                    .query_row(
                        &compiled.count_sql,
                        rusqlite::params_from_iter(compiled.count_params.iter()),
                        |row| row.get(0),
                    )
                    .map_err(wrap_err)?;

                let mut stmt = conn.prepare(&compiled.select_sql).map_err(wrap_err)?;
                let rows = stmt
                    .query_map(
                        rusqlite::params_from_iter(compiled.select_params.iter()),
                        row_to_document,
                    )
                    .map_err(wrap_err)?;

                let mut documents = Vec::new();
                for row_result in rows {
                    documents.push(row_result.map_err(wrap_err)?);
                }
                Ok((documents, total))
            })
            .await
            .map_err(map_tokio_rusqlite_error)?;

        Ok(Page::new(documents, u64::try_from(total).unwrap_or(0), params))
    }

    async fn create_document(&self, document: &Document, event: &DomainEvent) -> Result<()> {
        let row = document_to_row(document)?;
        let guarded = document.clone();

        self.write_with_event(
            document.kind,
            document.id,
            event,
            move |conn| {
                ensure_references_exist(&guarded, |kind, id| document_exists(conn, kind, id))
            },
            move |tx| {
                tx.execute(
                    schema::INSERT_DOCUMENT,
                    rusqlite::params![row.kind, row.id, row.fields, row.created_at, row.updated_at],
                )
            },
        )
        .await
    }

    async fn update_document(&self, document: &Document, event: &DomainEvent) -> Result<()> {
        let row = document_to_row(document)?;
        let guarded = document.clone();

        self.write_with_event(
            document.kind,
            document.id,
            event,
            move |conn| {
                ensure_exists(conn, guarded.kind, guarded.id)?;
                ensure_references_exist(&guarded, |kind, id| document_exists(conn, kind, id))
            },
            move |tx| {
                tx.execute(
                    schema::UPDATE_DOCUMENT,
                    rusqlite::params![row.kind, row.id, row.fields, row.updated_at],
                )
            },
        )
        .await
    }

    async fn delete_document(
        &self,
        kind: EntityKind,
        id: Uuid,
        event: &DomainEvent,
    ) -> Result<()> {
        let kind_str = kind.as_str();
        let id_str = id.to_string();

        self.write_with_event(
            kind,
            id,
            event,
            move |conn| {
                ensure_exists(conn, kind, id)?;
                ensure_not_referenced(kind, id, |reference, id| {
                    count_references(conn, reference, id)
                })
            },
            move |tx| tx.execute(schema::DELETE_DOCUMENT, [kind_str, id_str.as_str()]),
        )
        .await
    }
}

#[async_trait]
impl OutboxStore for SqliteRepository {
    async fn pending_messages(&self, limit: usize) -> Result<Vec<OutboxMessage>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        self.conn
            .call(move |conn| {
                let mut stmt = conn
                    .prepare(schema::SELECT_PENDING_OUTBOX_MESSAGES)
                    .map_err(wrap_err)?;
                let rows = stmt
                    .query_map([limit], row_to_outbox_message)
                    .map_err(wrap_err)?;

                let mut messages = Vec::new();
                for row_result in rows {
                    messages.push(row_result.map_err(wrap_err)?);
                }
                Ok(messages)
            })
            .await
            .map_err(map_tokio_rusqlite_error)
    }

    async fn mark_processed(&self, id: Uuid, processed_at: DateTime<Utc>) -> Result<()> {
        let id_str = id.to_string();
        let processed_at = format_timestamp(processed_at);

        self.conn
            .call(move |conn| {
                let rows = conn
                    .execute(schema::MARK_OUTBOX_PROCESSED, [id_str, processed_at])
                    .map_err(wrap_err)?;
                if rows == 0 {
                    Err(wrap_err(rusqlite::Error::QueryReturnedNoRows))
                } else {
                    Ok(())
                }
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error_with_id(e, "OutboxMessage", id.to_string()))
    }

    async fn mark_failed(&self, id: Uuid, error: &str, retry: bool) -> Result<()> {
        let id_str = id.to_string();
        let error = error.to_string();

        self.conn
            .call(move |conn| {
                let rows = conn
                    .execute(
                        schema::MARK_OUTBOX_FAILED,
                        rusqlite::params![id_str, error, !retry],
                    )
                    .map_err(wrap_err)?;
                if rows == 0 {
                    Err(wrap_err(rusqlite::Error::QueryReturnedNoRows))
                } else {
                    Ok(())
                }
            })
            .await
            .map_err(|e| map_tokio_rusqlite_error_with_id(e, "OutboxMessage", id.to_string()))
    }

    async fn count_pending(&self) -> Result<u64> {
        let count: i64 = self
            .conn
            .call(|conn| {
                conn.query_row(schema::COUNT_PENDING_OUTBOX_MESSAGES, [], |row| row.get(0))
                    .map_err(wrap_err)
            })
            .await
            .map_err(map_tokio_rusqlite_error)?;

        Ok(u64::try_from(count).unwrap_or(0))
    }
}
