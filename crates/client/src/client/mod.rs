//! HTTP client for the standards API.

pub mod events;
pub mod health;
pub mod resources;

use standards_core::domain::ValidationErrors;

use crate::error::{ClientError, Result};

/// HTTP client for the standards API.
#[derive(Debug, Clone)]
pub struct StandardsClient {
    client: reqwest::Client,
    base_url: String,
}

impl StandardsClient {
    /// Create a new client with the given base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Create from environment (STANDARDS_URL or default).
    pub fn from_env() -> Self {
        let base_url =
            std::env::var("STANDARDS_URL").unwrap_or_else(|_| "http://localhost:3000".to_string());
        Self::new(base_url)
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build a URL for an endpoint.
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Turns a non-success response into the matching error.
    async fn error_from(response: reqwest::Response) -> ClientError {
        let status = response.status().as_u16();
        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        error_for_status(status, message)
    }

    /// Handle responses with a JSON body.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T> {
        if response.status().is_success() {
            response.json().await.map_err(ClientError::from)
        } else {
            Err(Self::error_from(response).await)
        }
    }

    /// Handle responses without a body.
    async fn handle_empty_response(&self, response: reqwest::Response) -> Result<()> {
        if response.status().is_success() {
            Ok(())
        } else {
            Err(Self::error_from(response).await)
        }
    }
}

/// Validation failures come back as JSON, everything else as plain text.
fn error_for_status(status: u16, message: String) -> ClientError {
    match status {
        404 => ClientError::NotFound { message },
        400 => match serde_json::from_str::<ValidationErrors>(&message) {
            Ok(validation) => ClientError::Validation {
                errors: validation.errors,
            },
            Err(_) => ClientError::ServerError { status, message },
        },
        _ => ClientError::ServerError { status, message },
    }
}
