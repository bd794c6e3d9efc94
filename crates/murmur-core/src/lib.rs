//! # Murmur Core
//!
//! Leaf building blocks for replicating one piece of state over a named
//! broadcast channel:
//! - [`VersionedCell`]: a value plus an opaque version marker, with local observers
//! - [`IdCursor`] / [`ParticipantId`]: locally-unique participant identities
//! - [`SyncMessage`]: the `hi` / `update` wire entity and its JSON codec
//!
//! Nothing in this crate performs I/O. The transport lives in
//! `murmur-transport` and the protocol in `murmur-sync`.

#![forbid(unsafe_code)]

pub mod cell;
pub mod errors;
pub mod identifiers;
pub mod identity;
pub mod messages;

pub use cell::{Observer, Subscription, VersionedCell};
pub use errors::{MurmurError, Result};
pub use identifiers::{ChannelName, ParticipantId, PeerId, Version};
pub use identity::IdCursor;
pub use messages::{decode_message, encode_message, InboundMessage, SyncMessage};
