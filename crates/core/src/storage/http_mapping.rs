//! Maps repository errors to HTTP status codes.

use super::RepositoryError;

/// Maps a [`RepositoryError`] to an HTTP status code.
///
/// - `NotFound` -> 404
/// - `AlreadyExists`, `InUse` -> 409
/// - `ConnectionFailed` -> 503
/// - `QueryFailed`, `Serialization` -> 500
/// - `MissingReference`, `InvalidData`, `InvalidQuery` -> 400
///
/// # Examples
///
/// ```
/// use standards_core::storage::{RepositoryError, repository_error_to_status_code};
///
/// let error = RepositoryError::NotFound {
///     entity_type: "Room",
///     id: "abc-123".to_string(),
/// };
/// assert_eq!(repository_error_to_status_code(&error), 404);
/// ```
pub fn repository_error_to_status_code(error: &RepositoryError) -> u16 {
    match error {
        RepositoryError::NotFound { .. } => 404,
        RepositoryError::AlreadyExists { .. } | RepositoryError::InUse { .. } => 409,
        RepositoryError::ConnectionFailed(_) => 503,
        RepositoryError::QueryFailed(_) | RepositoryError::Serialization(_) => 500,
        RepositoryError::MissingReference { .. }
        | RepositoryError::InvalidData(_)
        | RepositoryError::InvalidQuery(_) => 400,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflicts_map_to_409() {
        let exists = RepositoryError::AlreadyExists {
            entity_type: "Unit",
            id: "u-1".to_string(),
        };
        let in_use = RepositoryError::InUse {
            entity_type: "Unit",
            id: "u-1".to_string(),
            referenced_by: "Material",
            count: 1,
        };
        assert_eq!(repository_error_to_status_code(&exists), 409);
        assert_eq!(repository_error_to_status_code(&in_use), 409);
    }

    #[test]
    fn test_connection_failed_maps_to_503() {
        let error = RepositoryError::ConnectionFailed("timeout".to_string());
        assert_eq!(repository_error_to_status_code(&error), 503);
    }

    #[test]
    fn test_internal_failures_map_to_500() {
        assert_eq!(
            repository_error_to_status_code(&RepositoryError::QueryFailed("syntax".to_string())),
            500
        );
        assert_eq!(
            repository_error_to_status_code(&RepositoryError::Serialization("eof".to_string())),
            500
        );
    }

    #[test]
    fn test_client_errors_map_to_400() {
        assert_eq!(
            repository_error_to_status_code(&RepositoryError::InvalidData("bad".to_string())),
            400
        );
        assert_eq!(
            repository_error_to_status_code(&RepositoryError::InvalidQuery("bad".to_string())),
            400
        );
        let missing = RepositoryError::MissingReference {
            field: "unit_id",
            entity_type: "Unit",
            id: "u-1".to_string(),
        };
        assert_eq!(repository_error_to_status_code(&missing), 400);
    }
}
