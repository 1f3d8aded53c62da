//! Generic resource operations.
//!
//! Records are returned as JSON since their shape depends on the kind.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use standards_core::domain::EntityKind;
use standards_core::query::{Page, QueryParameters};

use super::StandardsClient;
use crate::error::Result;

/// An entry of `GET /api/resources`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceInfo {
    pub kind: EntityKind,
    pub name: String,
    pub path: String,
}

impl StandardsClient {
    fn resource_url(&self, kind: EntityKind, suffix: &str) -> String {
        self.url(&format!("/api/{}{}", kind.path(), suffix))
    }

    /// List every record of a kind.
    pub async fn list(&self, kind: EntityKind) -> Result<Vec<Value>> {
        let response = self.client.get(self.resource_url(kind, "")).send().await?;
        self.handle_response(response).await
    }

    /// Filter, sort and page records of a kind.
    pub async fn search(&self, kind: EntityKind, params: &QueryParameters) -> Result<Page<Value>> {
        let url = format!(
            "{}?{}",
            self.resource_url(kind, "/search"),
            params.fingerprint()
        );
        let response = self.client.get(url).send().await?;
        self.handle_response(response).await
    }

    /// Get a record by ID.
    pub async fn get(&self, kind: EntityKind, id: Uuid) -> Result<Value> {
        let response = self
            .client
            .get(self.resource_url(kind, &format!("/{id}")))
            .send()
            .await?;
        self.handle_response(response).await
    }

    /// Get a record with its referenced records.
    pub async fn details(&self, kind: EntityKind, id: Uuid) -> Result<Value> {
        let response = self
            .client
            .get(self.resource_url(kind, &format!("/{id}/details")))
            .send()
            .await?;
        self.handle_response(response).await
    }

    /// Create a record.
    pub async fn create(&self, kind: EntityKind, data: &Value) -> Result<Value> {
        let response = self
            .client
            .post(self.resource_url(kind, ""))
            .json(data)
            .send()
            .await?;
        self.handle_response(response).await
    }

    /// Replace a record's data.
    pub async fn update(&self, kind: EntityKind, id: Uuid, data: &Value) -> Result<Value> {
        let response = self
            .client
            .put(self.resource_url(kind, &format!("/{id}")))
            .json(data)
            .send()
            .await?;
        self.handle_response(response).await
    }

    /// Apply a JSON merge patch to a record.
    pub async fn patch(&self, kind: EntityKind, id: Uuid, patch: &Value) -> Result<Value> {
        let response = self
            .client
            .patch(self.resource_url(kind, &format!("/{id}")))
            .json(patch)
            .send()
            .await?;
        self.handle_response(response).await
    }

    /// Delete a record.
    pub async fn delete(&self, kind: EntityKind, id: Uuid) -> Result<()> {
        let response = self
            .client
            .delete(self.resource_url(kind, &format!("/{id}")))
            .send()
            .await?;
        self.handle_empty_response(response).await
    }

    /// List the resource kinds the server exposes.
    pub async fn resources(&self) -> Result<Vec<ResourceInfo>> {
        let response = self.client.get(self.url("/api/resources")).send().await?;
        self.handle_response(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_url() {
        let client = StandardsClient::new("http://localhost:3000");
        assert_eq!(
            client.resource_url(EntityKind::CalibrationJournalItem, "/search"),
            format!(
                "http://localhost:3000/api/{}/search",
                EntityKind::CalibrationJournalItem.path()
            )
        );
    }
}
