//! Channel transport trait definitions

use crate::error::TransportResult;
use async_trait::async_trait;
use murmur_core::ChannelName;
use std::fmt;
use std::sync::Arc;

/// Opaque encoded message
pub type Frame = Vec<u8>;

/// Delivery properties a transport promises
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportGuarantees {
    /// Frames are never delivered back to the membership that sent them
    pub self_excluding: bool,
    /// Frames from one sender reach each receiver in send order
    pub per_sender_fifo: bool,
}

impl TransportGuarantees {
    /// What a browser-style broadcast channel provides
    pub const fn broadcast() -> Self {
        Self {
            self_excluding: true,
            per_sender_fifo: true,
        }
    }

    /// Names of the guarantees that are not met
    pub fn missing(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if !self.self_excluding {
            missing.push("self_excluding");
        }
        if !self.per_sender_fifo {
            missing.push("per_sender_fifo");
        }
        missing
    }
}

/// A named broadcast medium
pub trait ChannelTransport: Send + Sync {
    /// Delivery properties of this transport
    fn guarantees(&self) -> TransportGuarantees;

    /// Join `channel`, creating it if needed
    ///
    /// Every call yields a new membership. Joining a channel with no other
    /// members is not an error.
    fn join(&self, channel: &ChannelName) -> TransportResult<ChannelLink>;
}

impl<T: ChannelTransport + ?Sized> ChannelTransport for Arc<T> {
    fn guarantees(&self) -> TransportGuarantees {
        (**self).guarantees()
    }

    fn join(&self, channel: &ChannelName) -> TransportResult<ChannelLink> {
        (**self).join(channel)
    }
}

/// Outbound half of a membership
pub trait FrameSender: Send + Sync {
    /// Channel this sender belongs to
    fn channel(&self) -> &ChannelName;

    /// Fire-and-forget broadcast to every other member
    fn send(&self, frame: Frame) -> TransportResult<()>;
}

/// Inbound half of a membership
#[async_trait]
pub trait FrameReceiver: Send {
    /// Next frame, or `None` once the membership is closed
    async fn recv(&mut self) -> Option<Frame>;

    /// Next frame if one is already queued
    fn try_recv(&mut self) -> Option<Frame>;
}

/// Cloneable handle for sending on a joined channel
#[derive(Clone)]
pub struct ChannelSender {
    inner: Arc<dyn FrameSender>,
}

impl ChannelSender {
    /// Wrap a transport-specific sender
    pub fn new(inner: Arc<dyn FrameSender>) -> Self {
        Self { inner }
    }

    /// Channel this sender belongs to
    pub fn channel(&self) -> &ChannelName {
        self.inner.channel()
    }

    /// Broadcast a frame to every other member
    pub fn send(&self, frame: Frame) -> TransportResult<()> {
        self.inner.send(frame)
    }
}

impl fmt::Debug for ChannelSender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelSender")
            .field("channel", self.channel())
            .finish()
    }
}

/// Handle for receiving on a joined channel
pub struct ChannelReceiver {
    inner: Box<dyn FrameReceiver>,
}

impl ChannelReceiver {
    /// Wrap a transport-specific receiver
    pub fn new(inner: Box<dyn FrameReceiver>) -> Self {
        Self { inner }
    }

    /// Next frame, or `None` once the membership is closed
    pub async fn recv(&mut self) -> Option<Frame> {
        self.inner.recv().await
    }

    /// Next frame if one is already queued
    pub fn try_recv(&mut self) -> Option<Frame> {
        self.inner.try_recv()
    }
}

impl fmt::Debug for ChannelReceiver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelReceiver").finish_non_exhaustive()
    }
}

/// Both halves of one channel membership
#[derive(Debug)]
pub struct ChannelLink {
    /// Outbound half
    pub sender: ChannelSender,
    /// Inbound half
    pub receiver: ChannelReceiver,
}

impl ChannelLink {
    /// Split into sender and receiver
    pub fn split(self) -> (ChannelSender, ChannelReceiver) {
        (self.sender, self.receiver)
    }
}
