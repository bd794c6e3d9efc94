//! Transport errors

use murmur_core::ChannelName;

/// Transport operation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The broadcast primitive cannot be used (e.g. the hub was shut down)
    #[error("Transport unavailable: {reason}")]
    Unavailable {
        /// Why the transport cannot be used
        reason: String,
    },

    /// The membership behind a sender no longer exists
    #[error("Channel '{channel}' is closed for this member")]
    ChannelClosed {
        /// Channel the send targeted
        channel: ChannelName,
    },
}

impl TransportError {
    /// Create an unavailable error
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }
}

/// Result type for transport operations
pub type TransportResult<T> = Result<T, TransportError>;
