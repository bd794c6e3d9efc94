//! Error handling for replicated state

use murmur_core::MurmurError;
use murmur_transport::TransportError;

/// Errors surfaced by [`SharedState`](crate::SharedState) construction and writes
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// Joining or using the channel failed
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// The transport does not promise what the protocol relies on
    #[error("Transport does not guarantee {missing:?}")]
    ContractViolation {
        /// Names of the unmet guarantees
        missing: Vec<&'static str>,
    },

    /// Construction happened outside a tokio runtime
    #[error("No tokio runtime available to drive the receive loop")]
    RuntimeUnavailable,

    /// Invalid identifier or a value that failed to encode
    #[error(transparent)]
    Core(#[from] MurmurError),

    /// Invalid configuration
    #[error("Invalid configuration: {message}")]
    Config {
        /// What is wrong with the configuration
        message: String,
    },
}

impl SyncError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

/// Result type for sync operations
pub type SyncResult<T> = Result<T, SyncError>;
