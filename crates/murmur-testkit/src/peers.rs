//! Groups of participants on one channel

use murmur_sync::{Replicable, SharedState, SyncContext, SyncResult};
use murmur_transport::MemoryHub;

/// Participants sharing one isolated hub
pub struct PeerGroup<T> {
    /// Hub every peer joined through
    pub hub: MemoryHub,
    /// Context used to create the peers
    pub context: SyncContext,
    /// The peers, in creation order
    pub peers: Vec<SharedState<T>>,
}

impl<T: Replicable> PeerGroup<T> {
    /// Add one more peer to the group's channel
    pub fn join_late(&mut self, channel: &str) -> SyncResult<SharedState<T>> {
        let peer = self.context.join(channel, None)?;
        self.peers.push(peer.clone());
        Ok(peer)
    }

    /// Current value of every peer, in creation order
    pub fn states(&self) -> Vec<Option<T>> {
        self.peers.iter().map(SharedState::get_state).collect()
    }
}

impl<T: Replicable + PartialEq> PeerGroup<T> {
    /// Whether every peer holds `expected`
    pub fn all_hold(&self, expected: &T) -> bool {
        self.peers
            .iter()
            .all(|peer| peer.get_state().as_ref() == Some(expected))
    }

    /// Whether every peer holds the same version as the first one
    pub fn versions_agree(&self) -> bool {
        let mut versions = self.peers.iter().map(SharedState::version);
        match versions.next() {
            Some(first) => versions.all(|v| v == first),
            None => true,
        }
    }
}

/// Create `count` peers on `channel` over a fresh [`MemoryHub`]
///
/// Must be called inside a tokio runtime.
pub fn spawn_peers<T: Replicable>(channel: &str, count: usize) -> SyncResult<PeerGroup<T>> {
    let hub = MemoryHub::new();
    let context = SyncContext::new(hub.clone());
    let peers = (0..count)
        .map(|_| context.join(channel, None))
        .collect::<SyncResult<Vec<_>>>()?;
    Ok(PeerGroup {
        hub,
        context,
        peers,
    })
}
