//! Per-participant protocol counters

use std::sync::atomic::{AtomicU64, Ordering};

/// Protocol counters, updated by the receive loop and by local writes
#[derive(Debug, Default)]
pub struct SyncStats {
    hi_received: AtomicU64,
    updates_applied: AtomicU64,
    updates_ignored: AtomicU64,
    malformed_dropped: AtomicU64,
    frames_sent: AtomicU64,
}

/// Point-in-time copy of [`SyncStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncStatsSnapshot {
    /// `hi` messages received
    pub hi_received: u64,
    /// Remote updates that changed local state
    pub updates_applied: u64,
    /// Remote updates carrying the version already held
    pub updates_ignored: u64,
    /// Frames that failed to decode or broke a wire rule
    pub malformed_dropped: u64,
    /// Frames handed to the transport successfully
    pub frames_sent: u64,
}

impl SyncStats {
    pub(crate) fn record_hi(&self) {
        self.hi_received.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_applied(&self) {
        self.updates_applied.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_ignored(&self) {
        self.updates_ignored.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_malformed(&self) {
        self.malformed_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_sent(&self) {
        self.frames_sent.fetch_add(1, Ordering::Relaxed);
    }

    /// Copy the current values
    pub fn snapshot(&self) -> SyncStatsSnapshot {
        SyncStatsSnapshot {
            hi_received: self.hi_received.load(Ordering::Relaxed),
            updates_applied: self.updates_applied.load(Ordering::Relaxed),
            updates_ignored: self.updates_ignored.load(Ordering::Relaxed),
            malformed_dropped: self.malformed_dropped.load(Ordering::Relaxed),
            frames_sent: self.frames_sent.load(Ordering::Relaxed),
        }
    }
}
