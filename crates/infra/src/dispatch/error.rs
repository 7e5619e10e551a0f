//! Dispatcher error types

use gardenwise_domain::GardenwiseError;
use thiserror::Error;

use crate::errors::InfraError;

/// Dispatcher lifecycle errors
#[derive(Debug, Error)]
pub enum DispatcherError {
    /// Dispatcher is already running
    #[error("Dispatcher already running")]
    AlreadyRunning,

    /// Dispatcher is not running
    #[error("Dispatcher not running")]
    NotRunning,

    /// Workers did not finish within the join timeout
    #[error("Operation timed out after {seconds}s")]
    Timeout { seconds: u64 },

    /// A worker task panicked or was aborted
    #[error("Task join failed: {0}")]
    TaskJoinFailed(String),
}

impl From<DispatcherError> for InfraError {
    fn from(err: DispatcherError) -> Self {
        let domain_err = match err {
            DispatcherError::AlreadyRunning | DispatcherError::NotRunning => {
                GardenwiseError::InvalidRequest(err.to_string())
            }
            DispatcherError::Timeout { .. } => GardenwiseError::Timeout(err.to_string()),
            DispatcherError::TaskJoinFailed(_) => GardenwiseError::Internal(err.to_string()),
        };
        InfraError(domain_err)
    }
}

impl From<DispatcherError> for GardenwiseError {
    fn from(err: DispatcherError) -> Self {
        InfraError::from(err).into()
    }
}

/// Convenience type alias for dispatcher operations
pub type DispatcherResult<T> = Result<T, DispatcherError>;
