//! Health check operations.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::StandardsClient;
use crate::error::Result;

/// Body of `GET /healthz`.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthReport {
    pub backends: Value,
    pub cache: Value,
    pub outbox_pending: Option<u64>,
    pub event_history_size: usize,
}

impl StandardsClient {
    /// Liveness probe. True when the server answers 200.
    pub async fn livez(&self) -> Result<bool> {
        let response = self.client.get(self.url("/livez")).send().await?;
        Ok(response.status().is_success())
    }

    /// Cache counters, outbox backlog and backends.
    pub async fn healthz(&self) -> Result<HealthReport> {
        let response = self.client.get(self.url("/healthz")).send().await?;
        self.handle_response(response).await
    }

    /// Readiness probe (storage round trip).
    pub async fn readyz(&self) -> Result<Value> {
        let response = self.client.get(self.url("/readyz")).send().await?;
        self.handle_response(response).await
    }
}
