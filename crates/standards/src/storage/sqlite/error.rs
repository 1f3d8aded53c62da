//! SQLite error mapping.
//!
//! Maps `tokio_rusqlite::Error` and `rusqlite::Error` to `RepositoryError`.
//! Key violations become `AlreadyExists`, missing rows become `NotFound`.
//! A `RepositoryError` raised inside a transaction travels as
//! `tokio_rusqlite::Error::Other` and comes back out unchanged.

use rusqlite::ffi;
use standards_core::storage::RepositoryError;

fn is_key_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == ffi::SQLITE_CONSTRAINT_PRIMARYKEY
                || e.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

/// Maps a rusqlite error for the record `entity_type`/`id`.
fn map_rusqlite_error(err: &rusqlite::Error, entity_type: &'static str, id: &str) -> RepositoryError {
    match err {
        e if is_key_violation(e) => RepositoryError::AlreadyExists {
            entity_type,
            id: id.to_string(),
        },
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == ffi::SQLITE_CONSTRAINT_CHECK =>
        {
            RepositoryError::InvalidData(format!("{entity_type} {id}: {err}"))
        }
        rusqlite::Error::SqliteFailure(e, _)
            if matches!(
                e.code,
                rusqlite::ErrorCode::CannotOpen
                    | rusqlite::ErrorCode::DatabaseBusy
                    | rusqlite::ErrorCode::DatabaseLocked
            ) =>
        {
            RepositoryError::ConnectionFailed(err.to_string())
        }
        rusqlite::Error::QueryReturnedNoRows => RepositoryError::NotFound {
            entity_type,
            id: id.to_string(),
        },
        rusqlite::Error::FromSqlConversionFailure(..) => {
            RepositoryError::Serialization(err.to_string())
        }
        _ => RepositoryError::QueryFailed(err.to_string()),
    }
}

/// Maps a tokio_rusqlite error when the record ID is known at the call site.
pub fn map_tokio_rusqlite_error_with_id(
    err: tokio_rusqlite::Error,
    entity_type: &'static str,
    id: impl Into<String>,
) -> RepositoryError {
    match &err {
        tokio_rusqlite::Error::Rusqlite(rusqlite_err) => {
            map_rusqlite_error(rusqlite_err, entity_type, &id.into())
        }
        tokio_rusqlite::Error::Close(_) | tokio_rusqlite::Error::ConnectionClosed => {
            RepositoryError::ConnectionFailed("Connection closed unexpectedly".to_string())
        }
        tokio_rusqlite::Error::Other(other) => match other.downcast_ref::<RepositoryError>() {
            Some(error) => error.clone(),
            None => RepositoryError::QueryFailed(err.to_string()),
        },
        _ => RepositoryError::QueryFailed(err.to_string()),
    }
}

/// Maps a tokio_rusqlite error for operations not tied to one record.
pub fn map_tokio_rusqlite_error(err: tokio_rusqlite::Error) -> RepositoryError {
    map_tokio_rusqlite_error_with_id(err, "Document", "unknown")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sqlite_failure(code: rusqlite::ErrorCode, extended_code: i32) -> tokio_rusqlite::Error {
        let sqlite_err = ffi::Error {
            code,
            extended_code,
        };
        tokio_rusqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(sqlite_err, None))
    }

    #[test]
    fn test_primary_key_maps_to_already_exists() {
        let err = sqlite_failure(
            rusqlite::ErrorCode::ConstraintViolation,
            ffi::SQLITE_CONSTRAINT_PRIMARYKEY,
        );

        let result = map_tokio_rusqlite_error_with_id(err, "Room", "abc-123");

        assert_eq!(
            result,
            RepositoryError::AlreadyExists {
                entity_type: "Room",
                id: "abc-123".to_string()
            }
        );
    }

    #[test]
    fn test_check_constraint_maps_to_invalid_data() {
        let err = sqlite_failure(
            rusqlite::ErrorCode::ConstraintViolation,
            ffi::SQLITE_CONSTRAINT_CHECK,
        );
        assert!(matches!(
            map_tokio_rusqlite_error(err),
            RepositoryError::InvalidData(_)
        ));
    }

    #[test]
    fn test_busy_maps_to_connection_failed() {
        let err = sqlite_failure(rusqlite::ErrorCode::DatabaseBusy, ffi::SQLITE_BUSY);
        assert!(matches!(
            map_tokio_rusqlite_error(err),
            RepositoryError::ConnectionFailed(_)
        ));
    }

    #[test]
    fn test_no_rows_maps_to_not_found() {
        let err = tokio_rusqlite::Error::Rusqlite(rusqlite::Error::QueryReturnedNoRows);

        match map_tokio_rusqlite_error_with_id(err, "Floor", "f-1") {
            RepositoryError::NotFound { entity_type, id } => {
                assert_eq!(entity_type, "Floor");
                assert_eq!(id, "f-1");
            }
            other => panic!("Expected NotFound error, got {other:?}"),
        }
    }

    #[test]
    fn test_repository_error_passes_through() {
        let in_use = RepositoryError::InUse {
            entity_type: "Housing",
            id: "h-1".to_string(),
            referenced_by: "Floor",
            count: 1,
        };
        let err = tokio_rusqlite::Error::Other(Box::new(in_use.clone()));

        assert_eq!(map_tokio_rusqlite_error_with_id(err, "Housing", "h-1"), in_use);
    }

    #[test]
    fn test_other_error_maps_to_query_failed() {
        let err = tokio_rusqlite::Error::Other(Box::new(std::io::Error::other("test error")));
        assert!(matches!(
            map_tokio_rusqlite_error(err),
            RepositoryError::QueryFailed(_)
        ));
    }
}
