//! Backend API layer -- wire model, error taxonomy, and the HTTP client.

pub mod client;
pub mod model;

pub use self::client::HttpExecutionClient;
pub use self::model::{ExecutionBrief, ExecutionDetail, ExecutionStatus, TestResult};

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// Backend unreachable or answered with a non-success status.
    #[error("backend request to {url} failed: {reason}")]
    Network { url: String, reason: String },

    /// The execution is no longer known server-side.
    #[error("execution {execution_id} not found")]
    NotFound { execution_id: String },

    #[error("malformed response from {url}: {reason}")]
    MalformedResponse { url: String, reason: String },
}

impl ApiError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound { .. })
    }

    /// Failures that only mean "no data this round".
    pub fn is_transient(&self) -> bool {
        matches!(self, ApiError::Network { .. } | ApiError::MalformedResponse { .. })
    }
}

/// Read-only view of the backend's execution endpoints.
#[async_trait::async_trait]
pub trait ExecutionApi: Send + Sync {
    /// `GET {base}/executions`
    async fn list_executions(&self) -> Result<Vec<ExecutionBrief>, ApiError>;

    /// `GET {base}/executions/{execution_id}`
    async fn get_execution_detail(&self, execution_id: &str) -> Result<ExecutionDetail, ApiError>;
}
