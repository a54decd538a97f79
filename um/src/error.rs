//! User manager error types

use std::collections::HashMap;

use thiserror::Error;

use crate::transport::TransportError;

/// Errors surfaced by [`UserManager`](crate::manager::UserManager) operations
#[derive(Debug, Clone, Error)]
pub enum ManagerError {
    #[error("Invalid parameters: {0}")]
    ValidationFailed(String),

    #[error("User already exists: {0}")]
    UniqueKeyViolated(String),

    #[error("Batch of {requested} exceeds the limit of {limit}")]
    BatchLimitExceeded { limit: usize, requested: usize },

    #[error("Rate limit exceeded")]
    CapacityExceeded,

    #[error("Application not initialized")]
    ApplicationNotInitialized,

    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Upstream rejected request with status {status}: {message}")]
    UpstreamRejected { status: u16, code: Option<u32>, message: String },

    #[error("Failed to decode response: {0}")]
    DecodingFailed(String),

    #[error("{} of the batch failed", .0.len())]
    PartialBatchFailure(HashMap<String, ManagerError>),

    #[error("Session closed before the request completed")]
    SessionClosed,
}

impl ManagerError {
    /// Check if this is the admission queue refusing work
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, ManagerError::CapacityExceeded)
    }

    /// True for errors detected before any network attempt
    pub fn is_before_network(&self) -> bool {
        matches!(
            self,
            ManagerError::ValidationFailed(_)
                | ManagerError::UniqueKeyViolated(_)
                | ManagerError::BatchLimitExceeded { .. }
                | ManagerError::CapacityExceeded
                | ManagerError::ApplicationNotInitialized
        )
    }

    /// Per-user errors if this is a partial batch failure
    pub fn batch_errors(&self) -> Option<&HashMap<String, ManagerError>> {
        match self {
            ManagerError::PartialBatchFailure(errors) => Some(errors),
            _ => None,
        }
    }
}

impl From<TransportError> for ManagerError {
    fn from(err: TransportError) -> Self {
        ManagerError::UpstreamUnavailable(err.to_string())
    }
}
