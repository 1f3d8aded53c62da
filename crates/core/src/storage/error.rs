use thiserror::Error;

use crate::query::QueryError;

/// Errors that can occur during repository operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("{entity_type} not found: {id}")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },
    #[error("{entity_type} already exists: {id}")]
    AlreadyExists {
        entity_type: &'static str,
        id: String,
    },
    #[error("{entity_type} {id} is still referenced by {count} {referenced_by} record(s)")]
    InUse {
        entity_type: &'static str,
        id: String,
        referenced_by: &'static str,
        count: u64,
    },
    /// A reference field points at a record that does not exist.
    #[error("{entity_type} {id} does not exist")]
    MissingReference {
        field: &'static str,
        entity_type: &'static str,
        id: String,
    },
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
    #[error("Query failed: {0}")]
    QueryFailed(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Invalid data: {0}")]
    InvalidData(String),
    #[error("Invalid query: {0}")]
    InvalidQuery(String),
}

impl From<QueryError> for RepositoryError {
    fn from(error: QueryError) -> Self {
        RepositoryError::InvalidQuery(error.to_string())
    }
}

/// Result type for repository operations.
pub type Result<T> = std::result::Result<T, RepositoryError>;
