//! SQLite schema definitions and SQL query constants.

/// SQL statement to create all tables.
pub const CREATE_TABLES: &str = r#"
-- One row per record of any kind
CREATE TABLE IF NOT EXISTS documents (
    kind TEXT NOT NULL,
    id TEXT NOT NULL,
    fields TEXT NOT NULL CHECK (json_valid(fields)),
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    PRIMARY KEY (kind, id)
);

-- Domain events waiting to be published
CREATE TABLE IF NOT EXISTS outbox (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    id TEXT NOT NULL UNIQUE,
    event TEXT NOT NULL CHECK (json_valid(event)),
    occurred_at TEXT NOT NULL,
    attempts INTEGER NOT NULL DEFAULT 0,
    last_error TEXT,
    processed_at TEXT,
    dead INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_documents_kind_created ON documents(kind, created_at, id);
CREATE INDEX IF NOT EXISTS idx_outbox_pending ON outbox(processed_at, dead, occurred_at, seq);
"#;

/// Columns read by `row_to_document`, in order.
pub const DOCUMENT_COLUMNS: &str = "kind, id, fields, created_at, updated_at";

// Document queries
pub const INSERT_DOCUMENT: &str = r#"
INSERT INTO documents (kind, id, fields, created_at, updated_at)
VALUES (?1, ?2, ?3, ?4, ?5)
"#;

pub const SELECT_DOCUMENT: &str = r#"
SELECT kind, id, fields, created_at, updated_at
FROM documents
WHERE kind = ?1 AND id = ?2
"#;

pub const SELECT_DOCUMENTS_BY_KIND: &str = r#"
SELECT kind, id, fields, created_at, updated_at
FROM documents
WHERE kind = ?1
ORDER BY created_at, id
"#;

pub const UPDATE_DOCUMENT: &str = r#"
UPDATE documents
SET fields = ?3, updated_at = ?4
WHERE kind = ?1 AND id = ?2
"#;

pub const DELETE_DOCUMENT: &str = r#"
DELETE FROM documents
WHERE kind = ?1 AND id = ?2
"#;

pub const DOCUMENT_EXISTS: &str = r#"
SELECT EXISTS (SELECT 1 FROM documents WHERE kind = ?1 AND id = ?2)
"#;

pub const COUNT_SINGLE_REFERENCES: &str = r#"
SELECT COUNT(*)
FROM documents
WHERE kind = ?1 AND json_extract(fields, ?2) = ?3
"#;

pub const COUNT_MANY_REFERENCES: &str = r#"
SELECT COUNT(*)
FROM documents d
WHERE d.kind = ?1
  AND EXISTS (SELECT 1 FROM json_each(d.fields, ?2) je WHERE je.value = ?3)
"#;

// Outbox queries
pub const INSERT_OUTBOX_MESSAGE: &str = r#"
INSERT INTO outbox (id, event, occurred_at)
VALUES (?1, ?2, ?3)
"#;

pub const SELECT_PENDING_OUTBOX_MESSAGES: &str = r#"
SELECT event, attempts, last_error, processed_at, dead
FROM outbox
WHERE processed_at IS NULL AND dead = 0
ORDER BY occurred_at, seq
LIMIT ?1
"#;

pub const MARK_OUTBOX_PROCESSED: &str = r#"
UPDATE outbox
SET processed_at = ?2
WHERE id = ?1
"#;

pub const MARK_OUTBOX_FAILED: &str = r#"
UPDATE outbox
SET attempts = attempts + 1, last_error = ?2, dead = ?3
WHERE id = ?1
"#;

pub const COUNT_PENDING_OUTBOX_MESSAGES: &str = r#"
SELECT COUNT(*)
FROM outbox
WHERE processed_at IS NULL AND dead = 0
"#;
