//! Common error types for backend calls

use thiserror::Error;

/// Result type for backend operations
pub type BackendResult<T> = Result<T, BackendError>;

/// Errors that can occur while talking to platforms over the bus
#[derive(Debug, Error)]
pub enum BackendError {
    /// No agent with the requested identity is registered on the platform
    #[error("No agent '{identity}' on platform '{platform}'")]
    AgentNotFound {
        /// Platform that was searched
        platform: String,
        /// Agent identity that was looked up
        identity: String,
    },

    /// The call did not complete within its bound
    #[error("Call to {0} timed out")]
    Timeout(String),

    /// The remote side answered with an application-level failure
    #[error("Remote error: {message}")]
    Remote {
        /// Error code reported by the remote side, if any
        code: Option<i64>,
        /// Human-readable error message
        message: String,
    },

    /// Bus unreachable or connection failure
    #[error("Transport error: {0}")]
    Transport(String),

    /// The remote side answered with an unexpected payload
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Invalid request parameters
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl BackendError {
    /// Create a remote error without an error code
    pub fn remote(message: impl Into<String>) -> Self {
        Self::Remote {
            code: None,
            message: message.into(),
        }
    }

    /// Returns the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            BackendError::AgentNotFound { .. } => 404,
            BackendError::Timeout(_) => 504,
            BackendError::Remote { .. } => 502,
            BackendError::Transport(_) => 503,
            BackendError::Protocol(_) => 502,
            BackendError::InvalidRequest(_) => 400,
        }
    }
}
