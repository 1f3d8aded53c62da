use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use standards_core::domain::ValidationErrors;
use standards_core::query::QueryError;
use standards_core::storage::{repository_error_to_status_code, RepositoryError};

use crate::service::ServiceError;

/// A request the handler could not make sense of (e.g. malformed JSON).
#[derive(Debug, Error)]
#[error("{0}")]
pub struct BadRequest(pub String);

pub struct AppError(pub anyhow::Error);

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self(BadRequest(message.into()).into())
    }

    fn validation(errors: &ValidationErrors) -> Response {
        (StatusCode::BAD_REQUEST, Json(errors)).into_response()
    }

    fn repository(error: &RepositoryError) -> StatusCode {
        StatusCode::from_u16(repository_error_to_status_code(error))
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status_code = if let Some(service_error) = self.0.downcast_ref::<ServiceError>() {
            match service_error {
                ServiceError::Validation(errors) => return Self::validation(errors),
                ServiceError::Repository(e) => Self::repository(e),
            }
        } else if let Some(errors) = self.0.downcast_ref::<ValidationErrors>() {
            return Self::validation(errors);
        } else if let Some(repo_error) = self.0.downcast_ref::<RepositoryError>() {
            Self::repository(repo_error)
        } else if self.0.is::<QueryError>() || self.0.is::<BadRequest>() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };

        if status_code.is_server_error() {
            tracing::error!(status = %status_code, error = %self.0, "Request failed");
        } else {
            tracing::debug!(status = %status_code, error = %self.0, "Request rejected");
        }

        (status_code, self.0.to_string()).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
