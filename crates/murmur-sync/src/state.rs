//! Replicated state participant
//!
//! A [`SharedState`] owns one [`VersionedCell`], one [`ParticipantId`] and
//! one channel membership. Construction goes `Joining -> Active` without
//! yielding: the cell is created, the channel joined, the receive loop
//! spawned and `hi` broadcast before the constructor returns.

use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::stats::{SyncStats, SyncStatsSnapshot};
use murmur_core::{
    decode_message, encode_message, ChannelName, IdCursor, InboundMessage, ParticipantId,
    Subscription, SyncMessage, Version, VersionedCell,
};
use murmur_transport::{ChannelReceiver, ChannelSender, ChannelTransport};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Values that can be replicated over a channel
pub trait Replicable: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {}

impl<T> Replicable for T where T: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {}

struct Participant<T> {
    target_id: ParticipantId,
    channel: ChannelName,
    cell: VersionedCell<T>,
    sender: ChannelSender,
    config: SyncConfig,
    stats: SyncStats,
}

impl<T: Replicable> Participant<T> {
    fn broadcast(&self, message: &SyncMessage<T>) -> SyncResult<()> {
        let frame = encode_message(message)?;
        match self.sender.send(frame) {
            Ok(()) => {
                self.stats.record_sent();
                tracing::debug!(
                    channel = %self.channel,
                    target_id = %self.target_id,
                    kind = message.kind(),
                    "Broadcast message"
                );
            }
            Err(e) => {
                // Best effort: a closed membership just means nobody hears us.
                tracing::debug!(
                    channel = %self.channel,
                    target_id = %self.target_id,
                    kind = message.kind(),
                    error = %e,
                    "Dropped outbound message"
                );
            }
        }
        Ok(())
    }

    fn propagate_snapshot(&self) -> SyncResult<()> {
        let (value, version) = self.cell.snapshot_with_version();
        if version.is_initial() {
            return Ok(());
        }
        let Some(value) = value else {
            return Ok(());
        };
        self.broadcast(&SyncMessage::update(self.target_id, version, value))
    }

    fn handle_frame(&self, frame: &[u8]) {
        if frame.len() > self.config.max_frame_bytes {
            self.stats.record_malformed();
            tracing::warn!(
                channel = %self.channel,
                target_id = %self.target_id,
                size = frame.len(),
                limit = self.config.max_frame_bytes,
                "Dropping oversized frame"
            );
            return;
        }

        let message = match decode_message::<T>(frame) {
            Ok(message) => message,
            Err(e) => {
                self.stats.record_malformed();
                tracing::warn!(
                    channel = %self.channel,
                    target_id = %self.target_id,
                    error = %e,
                    "Dropping malformed frame"
                );
                return;
            }
        };

        match message {
            InboundMessage::Hi { target_id: from } => {
                self.stats.record_hi();
                tracing::debug!(
                    channel = %self.channel,
                    target_id = %self.target_id,
                    %from,
                    "Peer joined"
                );
                if !self.config.answer_announcements {
                    return;
                }
                if let Err(e) = self.propagate_snapshot() {
                    tracing::warn!(
                        channel = %self.channel,
                        target_id = %self.target_id,
                        error = %e,
                        "Failed to answer announcement"
                    );
                }
            }
            InboundMessage::Update {
                target_id: from,
                hash,
                snapshot,
            } => {
                // "0" means "no state yet"; applying it would make this
                // participant look empty to later joiners.
                if hash.is_initial() {
                    self.stats.record_malformed();
                    tracing::warn!(
                        channel = %self.channel,
                        target_id = %self.target_id,
                        %from,
                        "Dropping update that carries the initial version"
                    );
                    return;
                }
                let version = hash.clone();
                if self.cell.apply_if_newer(snapshot, hash) {
                    self.stats.record_applied();
                    tracing::debug!(
                        channel = %self.channel,
                        target_id = %self.target_id,
                        %from,
                        %version,
                        "Applied remote update"
                    );
                } else {
                    self.stats.record_ignored();
                    tracing::debug!(
                        channel = %self.channel,
                        target_id = %self.target_id,
                        %from,
                        %version,
                        "Ignored known version"
                    );
                }
            }
        }
    }
}

async fn receive_loop<T: Replicable>(
    participant: Arc<Participant<T>>,
    mut receiver: ChannelReceiver,
) {
    while let Some(frame) = receiver.recv().await {
        participant.handle_frame(&frame);
    }
    tracing::debug!(
        channel = %participant.channel,
        target_id = %participant.target_id,
        "Receive loop finished"
    );
}

/// Aborts the receive loop when the last [`SharedState`] clone goes away
struct ReceiveTask {
    handle: JoinHandle<()>,
}

impl Drop for ReceiveTask {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// One participant in a replicated state channel
///
/// Clones share the same participant. Dropping the last clone stops the
/// receive loop, which leaves the channel.
pub struct SharedState<T> {
    participant: Arc<Participant<T>>,
    task: Arc<ReceiveTask>,
}

impl<T> Clone for SharedState<T> {
    fn clone(&self) -> Self {
        Self {
            participant: self.participant.clone(),
            task: self.task.clone(),
        }
    }
}

impl<T: Replicable> SharedState<T> {
    /// Join `channel` on `transport`
    ///
    /// Fails fast when the config is invalid, when the transport does not
    /// guarantee self-exclusion and per-sender ordering, when no tokio runtime
    /// is running, or when the transport cannot join.
    pub fn join<Tr>(
        transport: &Tr,
        cursor: &IdCursor,
        config: SyncConfig,
        channel: ChannelName,
        initial: Option<T>,
    ) -> SyncResult<Self>
    where
        Tr: ChannelTransport + ?Sized,
    {
        config.validate()?;

        let missing = transport.guarantees().missing();
        if !missing.is_empty() {
            return Err(SyncError::ContractViolation { missing });
        }

        let runtime =
            tokio::runtime::Handle::try_current().map_err(|_| SyncError::RuntimeUnavailable)?;

        let target_id = cursor.next_id();
        let cell = VersionedCell::new(initial);
        let (sender, receiver) = transport.join(&channel)?.split();

        let participant = Arc::new(Participant {
            target_id,
            channel,
            cell,
            sender,
            config,
            stats: SyncStats::default(),
        });

        let task = Arc::new(ReceiveTask {
            handle: runtime.spawn(receive_loop(participant.clone(), receiver)),
        });
        tracing::debug!(
            channel = %participant.channel,
            target_id = %participant.target_id,
            "Joined channel"
        );

        let state = Self { participant, task };
        if state.participant.config.announce_on_join {
            state.participant.broadcast(&SyncMessage::hi(target_id))?;
        }
        Ok(state)
    }

    /// Register a change observer
    ///
    /// Observers fire for local writes and for applied remote updates. See
    /// [`VersionedCell::subscribe`] for the unsubscribe rules.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.participant.cell.subscribe(listener)
    }

    /// Current value
    pub fn get_state(&self) -> Option<T> {
        self.participant.cell.get_snapshot()
    }

    /// Alias of [`SharedState::get_state`]
    pub fn get_snapshot(&self) -> Option<T> {
        self.get_state()
    }

    /// Write a new value
    ///
    /// Mints a fresh version, applies it locally (observers run before this
    /// returns), then broadcasts it. Returns the new version. Fails only when
    /// the value cannot be encoded; the local write has happened by then.
    pub fn set_state(&self, value: T) -> SyncResult<Version> {
        let participant = &self.participant;
        let version = Version::fresh();
        participant
            .cell
            .set_snapshot(Some(value.clone()), version.clone());
        participant.broadcast(&SyncMessage::update(
            participant.target_id,
            version.clone(),
            value,
        ))?;
        Ok(version)
    }

    /// Alias of [`SharedState::set_state`]
    pub fn set_snapshot(&self, value: T) -> SyncResult<Version> {
        self.set_state(value)
    }

    /// Current version marker
    pub fn version(&self) -> Version {
        self.participant.cell.version()
    }

    /// This participant's identity
    pub fn target_id(&self) -> ParticipantId {
        self.participant.target_id
    }

    /// The joined channel
    pub fn channel_name(&self) -> &ChannelName {
        &self.participant.channel
    }

    /// Underlying channel sender, for consumers that need direct access
    pub fn sender(&self) -> &ChannelSender {
        &self.participant.sender
    }

    /// Protocol counters
    pub fn stats(&self) -> SyncStatsSnapshot {
        self.participant.stats.snapshot()
    }

    /// Stop receiving and leave the channel
    ///
    /// Local reads and writes keep working; writes are no longer delivered.
    pub fn close(&self) {
        self.task.handle.abort();
    }

    /// Whether the receive loop is still running
    pub fn is_active(&self) -> bool {
        !self.task.handle.is_finished()
    }
}

impl<T: fmt::Debug + Clone> fmt::Debug for SharedState<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedState")
            .field("target_id", &self.participant.target_id)
            .field("channel", &self.participant.channel)
            .field("cell", &self.participant.cell)
            .finish()
    }
}
