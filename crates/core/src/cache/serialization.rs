//! JSON encoding of cached values.
//!
//! JSON keeps cache values readable with `redis-cli` and the like.

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

/// Errors that can occur during cache serialization/deserialization.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SerializationError {
    #[error("Failed to serialize: {0}")]
    SerializeFailed(String),
    #[error("Failed to deserialize: {0}")]
    DeserializeFailed(String),
}

/// Result type for serialization operations.
pub type Result<T> = std::result::Result<T, SerializationError>;

/// Encodes a value as JSON bytes.
pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(value).map_err(|e| SerializationError::SerializeFailed(e.to_string()))
}

/// Decodes JSON bytes written by [`encode`].
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    serde_json::from_slice(bytes).map_err(|e| SerializationError::DeserializeFailed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Housing, Record};
    use crate::query::{Page, QueryParameters};

    #[test]
    fn test_page_of_records() {
        let record = Record::new(Housing::new("Main", "M", "1 Main St", 3));
        let page = Page::new(vec![record.clone()], 1, &QueryParameters::default());

        let bytes = encode(&page).unwrap();
        let decoded: Page<Record<Housing>> = decode(&bytes).unwrap();

        assert_eq!(decoded.items, vec![record]);
        assert_eq!(decoded.total, 1);
    }

    #[test]
    fn test_empty_list_encodes_as_array() {
        let empty: Vec<Record<Housing>> = vec![];
        assert_eq!(encode(&empty).unwrap(), b"[]");
    }

    #[test]
    fn test_decode_wrong_shape() {
        let err = decode::<Vec<Record<Housing>>>(b"{\"items\": []}").unwrap_err();
        assert!(matches!(err, SerializationError::DeserializeFailed(_)));
    }

    #[test]
    fn test_decode_garbage() {
        let err = decode::<Record<Housing>>(b"not json").unwrap_err();
        assert!(matches!(err, SerializationError::DeserializeFailed(_)));
    }
}
