use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::{ApiError, ExecutionApi, ExecutionBrief, ExecutionDetail};

/// reqwest-backed client for the backend's two read endpoints.
pub struct HttpExecutionClient {
    client: Client,
    base: Url,
}

impl HttpExecutionClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base = Url::parse(base_url)
            .with_context(|| format!("invalid backend base URL '{}'", base_url))?;
        if base.cannot_be_a_base() {
            anyhow::bail!("backend base URL '{}' cannot carry a path", base_url);
        }
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self { client, base })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// `{base}/executions[/{id}]`, with the id percent-encoded as one segment.
    fn executions_url(&self, execution_id: Option<&str>) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push("executions");
            if let Some(id) = execution_id {
                segments.push(id);
            }
        }
        url
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        execution_id: Option<&str>,
    ) -> Result<T, ApiError> {
        debug!(%url, "GET");
        let response = self.client.get(url.clone()).send().await.map_err(|e| ApiError::Network {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            if let Some(id) = execution_id {
                return Err(ApiError::NotFound {
                    execution_id: id.to_string(),
                });
            }
        }
        if !status.is_success() {
            return Err(ApiError::Network {
                url: url.to_string(),
                reason: format!("HTTP {}", status),
            });
        }

        let body = response.bytes().await.map_err(|e| ApiError::Network {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        serde_json::from_slice(&body).map_err(|e| ApiError::MalformedResponse {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }
}

#[async_trait::async_trait]
impl ExecutionApi for HttpExecutionClient {
    async fn list_executions(&self) -> Result<Vec<ExecutionBrief>, ApiError> {
        self.get_json(self.executions_url(None), None).await
    }

    async fn get_execution_detail(&self, execution_id: &str) -> Result<ExecutionDetail, ApiError> {
        self.get_json(self.executions_url(Some(execution_id)), Some(execution_id))
            .await
    }
}
