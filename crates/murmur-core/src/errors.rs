//! Error type shared by the murmur core building blocks.

/// Errors raised while validating identifiers or (de)serializing wire messages
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MurmurError {
    /// Invalid input
    #[error("Invalid: {message}")]
    Invalid {
        /// What was rejected and why
        message: String,
    },

    /// Serialization/deserialization error
    #[error("Serialization error: {message}")]
    Serialization {
        /// Error message from the codec
        message: String,
    },
}

impl MurmurError {
    /// Create an invalid input error
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }

    /// Create a serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for MurmurError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(err.to_string())
    }
}

/// Standard Result type for murmur core operations
pub type Result<T> = std::result::Result<T, MurmurError>;
