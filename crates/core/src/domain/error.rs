use thiserror::Error;

/// Errors raised by domain helpers outside of payload validation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Unknown entity kind: {0}")]
    UnknownKind(String),
}
