//! Runtime error types

use core_types::{ResourceHandle, ResourceKind, StatusCode};
use thiserror::Error;

/// Errors reported by runtime operations
///
/// None of these are fatal: the runtime's tables are left exactly as they
/// were before the failing call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RtError {
    /// Null or out-of-range argument
    #[error("Invalid parameter: {0}")]
    InvalidParameter(&'static str),

    /// Fixed-capacity table is full
    #[error("Resource exhausted: no free {0} slot")]
    ResourceExhausted(ResourceKind),

    /// Stale or out-of-range handle
    #[error("Invalid handle: {0}")]
    InvalidHandle(ResourceHandle),

    /// Query before the required setup
    #[error("Not initialized: {0}")]
    NotInitialized(&'static str),

    /// Lookup miss
    #[error("Not found: {0}")]
    NotFound(String),

    /// The task backend refused an operation
    #[error("Backend failure: {0}")]
    BackendFailure(String),

    /// A code reported by application code
    #[error("Application error: {0}")]
    Application(StatusCode),
}

impl RtError {
    /// Returns the numeric status for this error
    pub fn status(&self) -> StatusCode {
        match self {
            RtError::InvalidParameter(_) => StatusCode::INVALID_PARAMETER,
            RtError::ResourceExhausted(_) => StatusCode::RESOURCE_EXHAUSTED,
            RtError::InvalidHandle(_) => StatusCode::INVALID_HANDLE,
            RtError::NotInitialized(_) => StatusCode::NOT_INITIALIZED,
            RtError::NotFound(_) => StatusCode::NOT_FOUND,
            RtError::BackendFailure(_) => StatusCode::BACKEND_FAILURE,
            RtError::Application(code) => *code,
        }
    }
}

impl From<RtError> for StatusCode {
    fn from(err: RtError) -> Self {
        err.status()
    }
}

/// Result alias used throughout the runtime
pub type RtResult<T> = Result<T, RtError>;
