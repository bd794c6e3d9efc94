//! Wire messages exchanged over a channel.
//!
//! ```text
//! { "kind": "hi",     "targetId": "3" }
//! { "kind": "update", "targetId": "3", "hash": "<version>", "snapshot": <T> }
//! ```
//!
//! Frames are JSON. Anything that does not decode into a [`SyncMessage`]
//! (unknown `kind`, missing field, wrong snapshot shape) is an error for the
//! caller to discard. Outbound messages carry a [`ParticipantId`]; inbound
//! ones keep the sender's `targetId` as an opaque [`PeerId`].

use crate::errors::{MurmurError, Result};
use crate::identifiers::{ParticipantId, PeerId, Version};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Protocol message, generic over the sender identity type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum SyncMessage<T, I = ParticipantId> {
    /// A participant has joined the channel
    #[serde(rename = "hi")]
    Hi {
        /// Sender identity
        #[serde(rename = "targetId")]
        target_id: I,
    },
    /// Current value and the version that produced it
    #[serde(rename = "update")]
    Update {
        /// Sender identity
        #[serde(rename = "targetId")]
        target_id: I,
        /// Version marker
        hash: Version,
        /// Replicated value
        snapshot: T,
    },
}

/// A message as decoded from a frame
pub type InboundMessage<T> = SyncMessage<T, PeerId>;

impl<T, I> SyncMessage<T, I> {
    /// Build a join announcement
    pub fn hi(target_id: I) -> Self {
        Self::Hi { target_id }
    }

    /// Build a state update
    pub fn update(target_id: I, hash: Version, snapshot: T) -> Self {
        Self::Update {
            target_id,
            hash,
            snapshot,
        }
    }

    /// Sender identity
    pub fn target_id(&self) -> &I {
        match self {
            Self::Hi { target_id } | Self::Update { target_id, .. } => target_id,
        }
    }

    /// Wire tag
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Hi { .. } => "hi",
            Self::Update { .. } => "update",
        }
    }
}

/// Encode a message into a JSON frame
pub fn encode_message<T: Serialize, I: Serialize>(message: &SyncMessage<T, I>) -> Result<Vec<u8>> {
    serde_json::to_vec(message).map_err(MurmurError::from)
}

/// Decode a JSON frame
pub fn decode_message<T: DeserializeOwned>(bytes: &[u8]) -> Result<InboundMessage<T>> {
    serde_json::from_slice(bytes).map_err(MurmurError::from)
}
