//! In-process broadcast hub
//!
//! Every membership gets its own unbounded FIFO inbox. A send fans the frame
//! out to every other live inbox on the channel, which gives per-sender
//! ordering and self-exclusion. Delivery is asynchronous: frames sit in the
//! inbox until the receiver polls.

use crate::channel::{
    ChannelLink, ChannelReceiver, ChannelSender, ChannelTransport, Frame, FrameReceiver,
    FrameSender, TransportGuarantees,
};
use crate::error::{TransportError, TransportResult};
use async_trait::async_trait;
use murmur_core::ChannelName;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Weak};
use tokio::sync::mpsc;

static GLOBAL_HUB: Lazy<MemoryHub> = Lazy::new(MemoryHub::new);

type Inbox = mpsc::UnboundedSender<Frame>;

/// Registry for in-memory channel memberships
#[derive(Debug, Default)]
struct HubRegistry {
    /// Inboxes by channel, then by member key
    channels: HashMap<ChannelName, BTreeMap<u64, Inbox>>,
    next_member: u64,
    shut_down: bool,
}

impl HubRegistry {
    fn leave(&mut self, channel: &ChannelName, member: u64) {
        if let Some(members) = self.channels.get_mut(channel) {
            members.remove(&member);
            if members.is_empty() {
                self.channels.remove(channel);
            }
        }
    }
}

/// In-process broadcast hub
///
/// Clones share the same registry. Two hubs created with [`MemoryHub::new`]
/// are fully isolated from each other.
#[derive(Debug, Clone, Default)]
pub struct MemoryHub {
    registry: Arc<RwLock<HubRegistry>>,
}

impl MemoryHub {
    /// Create an empty hub
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide hub
    pub fn global() -> &'static MemoryHub {
        &GLOBAL_HUB
    }

    /// Close every membership and refuse further joins
    pub fn shutdown(&self) {
        let mut registry = self.registry.write();
        registry.shut_down = true;
        registry.channels.clear();
        tracing::debug!("Memory hub shut down");
    }

    /// Whether [`MemoryHub::shutdown`] has been called
    pub fn is_shut_down(&self) -> bool {
        self.registry.read().shut_down
    }

    /// Number of live memberships on `channel`
    pub fn member_count(&self, channel: &ChannelName) -> usize {
        self.registry
            .read()
            .channels
            .get(channel)
            .map_or(0, BTreeMap::len)
    }

    /// Hub statistics
    pub fn stats(&self) -> HubStats {
        let registry = self.registry.read();
        HubStats {
            channels: registry.channels.len(),
            memberships: registry.channels.values().map(BTreeMap::len).sum(),
        }
    }
}

/// Hub statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HubStats {
    /// Channels with at least one member
    pub channels: usize,
    /// Live memberships across all channels
    pub memberships: usize,
}

impl ChannelTransport for MemoryHub {
    fn guarantees(&self) -> TransportGuarantees {
        TransportGuarantees::broadcast()
    }

    fn join(&self, channel: &ChannelName) -> TransportResult<ChannelLink> {
        let (tx, rx) = mpsc::unbounded_channel();

        let member = {
            let mut registry = self.registry.write();
            if registry.shut_down {
                return Err(TransportError::unavailable("memory hub has been shut down"));
            }
            registry.next_member += 1;
            let member = registry.next_member;
            registry
                .channels
                .entry(channel.clone())
                .or_default()
                .insert(member, tx);
            member
        };

        tracing::debug!(channel = %channel, member, "Joined memory channel");

        let sender = MemorySender {
            channel: channel.clone(),
            member,
            registry: Arc::downgrade(&self.registry),
        };
        let receiver = MemoryReceiver {
            channel: channel.clone(),
            member,
            inbox: rx,
            registry: Arc::downgrade(&self.registry),
        };

        Ok(ChannelLink {
            sender: ChannelSender::new(Arc::new(sender)),
            receiver: ChannelReceiver::new(Box::new(receiver)),
        })
    }
}

struct MemorySender {
    channel: ChannelName,
    member: u64,
    registry: Weak<RwLock<HubRegistry>>,
}

impl FrameSender for MemorySender {
    fn channel(&self) -> &ChannelName {
        &self.channel
    }

    fn send(&self, frame: Frame) -> TransportResult<()> {
        let Some(registry) = self.registry.upgrade() else {
            return Err(TransportError::unavailable("memory hub dropped"));
        };

        let dead: Vec<u64> = {
            let guard = registry.read();
            if guard.shut_down {
                return Err(TransportError::unavailable("memory hub has been shut down"));
            }
            let members = guard
                .channels
                .get(&self.channel)
                .filter(|members| members.contains_key(&self.member))
                .ok_or_else(|| TransportError::ChannelClosed {
                    channel: self.channel.clone(),
                })?;

            members
                .iter()
                .filter(|(key, _)| **key != self.member)
                .filter_map(|(key, inbox)| inbox.send(frame.clone()).err().map(|_| *key))
                .collect()
        };

        if !dead.is_empty() {
            let mut guard = registry.write();
            for member in dead {
                tracing::debug!(channel = %self.channel, member, "Pruning closed member inbox");
                guard.leave(&self.channel, member);
            }
        }

        Ok(())
    }
}

struct MemoryReceiver {
    channel: ChannelName,
    member: u64,
    inbox: mpsc::UnboundedReceiver<Frame>,
    registry: Weak<RwLock<HubRegistry>>,
}

#[async_trait]
impl FrameReceiver for MemoryReceiver {
    async fn recv(&mut self) -> Option<Frame> {
        self.inbox.recv().await
    }

    fn try_recv(&mut self) -> Option<Frame> {
        self.inbox.try_recv().ok()
    }
}

impl Drop for MemoryReceiver {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.write().leave(&self.channel, self.member);
            tracing::debug!(channel = %self.channel, member = self.member, "Left memory channel");
        }
    }
}
