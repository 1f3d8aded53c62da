use thiserror::Error;

/// Errors raised while parsing query parameters.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("Invalid field name: {0}")]
    InvalidField(String),
    #[error("Unknown filter operator: {0}")]
    UnknownOperator(String),
    #[error("Malformed filter (expected field:op:value): {0}")]
    MalformedFilter(String),
    #[error("Invalid page: {0}")]
    InvalidPage(String),
    #[error("Invalid page size: {0} (expected 1..={max})", max = super::MAX_PAGE_SIZE)]
    InvalidPageSize(String),
}
