//! Identifier types used by the replication protocol
//!
//! - [`ParticipantId`]: identity minted locally by an [`IdCursor`](crate::IdCursor)
//! - [`PeerId`]: sender identity as read off the wire
//! - [`Version`]: opaque marker of one state-assignment event
//! - [`ChannelName`]: the shared key that groups participants

use crate::errors::MurmurError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Identity of one participant within a process
///
/// Serialized as a decimal string (`"1"`, `"2"`, ...). Only used for message
/// provenance, never for conflict resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct ParticipantId(u64);

impl ParticipantId {
    /// Create from a raw counter value
    pub fn from_raw(value: u64) -> Self {
        Self(value)
    }

    /// Get the raw counter value
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ParticipantId {
    type Err = MurmurError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u64>()
            .map(Self)
            .map_err(|e| MurmurError::invalid(format!("participant id '{s}': {e}")))
    }
}

impl From<ParticipantId> for String {
    fn from(id: ParticipantId) -> Self {
        id.to_string()
    }
}

impl TryFrom<String> for ParticipantId {
    type Error = MurmurError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Sender identity carried by an inbound message
///
/// Kept as the raw `targetId` string. Other participants may mint ids in any
/// shape, so nothing beyond "it is a string" is assumed when receiving.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PeerId(String);

impl PeerId {
    /// Borrow the raw id
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<ParticipantId> for PeerId {
    fn from(id: ParticipantId) -> Self {
        Self(id.to_string())
    }
}

impl From<&str> for PeerId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for PeerId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Opaque version marker ("hash" on the wire)
///
/// Two cells holding the same version hold the same value. [`Version::initial`]
/// is the reserved "no state yet" sentinel and is never produced by
/// [`Version::fresh`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Version(String);

impl Version {
    /// Wire representation of the sentinel
    pub const INITIAL: &'static str = "0";

    /// The "no state yet" sentinel
    pub fn initial() -> Self {
        Self(Self::INITIAL.to_string())
    }

    /// Mint a new marker for a local assignment
    ///
    /// Random, not derived from content: writing the same value twice yields
    /// two distinct versions.
    pub fn fresh() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Whether this is the sentinel
    pub fn is_initial(&self) -> bool {
        self.0 == Self::INITIAL
    }

    /// Borrow the marker string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Version {
    fn default() -> Self {
        Self::initial()
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Version {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for Version {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Name of a broadcast channel
///
/// Participants that join the same name see each other's messages. The name
/// must not be empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ChannelName(String);

impl ChannelName {
    /// Validate and wrap a channel name
    pub fn new(name: impl Into<String>) -> Result<Self, MurmurError> {
        let name = name.into();
        if name.is_empty() {
            return Err(MurmurError::invalid("channel name must not be empty"));
        }
        Ok(Self(name))
    }

    /// Borrow the name
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChannelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ChannelName {
    type Err = MurmurError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for ChannelName {
    type Error = MurmurError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for ChannelName {
    type Error = MurmurError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ChannelName> for String {
    fn from(name: ChannelName) -> Self {
        name.0
    }
}
