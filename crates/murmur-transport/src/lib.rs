//! # Murmur Transport
//!
//! Abstraction over a named broadcast medium plus an in-process
//! implementation.
//!
//! A transport hands out one [`ChannelLink`] per [`ChannelTransport::join`]
//! call. The link's [`ChannelSender`] fans frames out to every *other*
//! membership on the same channel; its [`ChannelReceiver`] yields frames sent
//! by others, in arrival order.
//!
//! Transports state what they guarantee through [`TransportGuarantees`] so
//! the protocol can refuse one that does not fit its assumptions.

#![forbid(unsafe_code)]

pub mod channel;
pub mod error;
pub mod memory;

pub use channel::{
    ChannelLink, ChannelReceiver, ChannelSender, ChannelTransport, Frame, FrameReceiver,
    FrameSender, TransportGuarantees,
};
pub use error::{TransportError, TransportResult};
pub use memory::{HubStats, MemoryHub};
