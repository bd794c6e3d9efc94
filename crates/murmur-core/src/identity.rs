//! Participant identity allocation
//!
//! An [`IdCursor`] hands out [`ParticipantId`]s from a monotonically
//! increasing counter. The counter starts at 0 and is incremented before
//! use, so the first id is `1`. Values are never reused and never reset.

use crate::identifiers::ParticipantId;
use once_cell::sync::Lazy;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static GLOBAL_CURSOR: Lazy<Arc<IdCursor>> = Lazy::new(|| Arc::new(IdCursor::new()));

/// Monotonic participant id allocator
#[derive(Debug, Default)]
pub struct IdCursor {
    value: AtomicU64,
}

impl IdCursor {
    /// Create a cursor starting at 0
    pub fn new() -> Self {
        Self {
            value: AtomicU64::new(0),
        }
    }

    /// The process-wide cursor.
    ///
    /// Shared state that lives for the whole process and is never reset.
    /// Prefer an owned cursor (see `SyncContext` in `murmur-sync`) unless
    /// ids must be unique across every context in the process.
    pub fn global() -> Arc<IdCursor> {
        GLOBAL_CURSOR.clone()
    }

    /// Allocate the next id
    pub fn next_id(&self) -> ParticipantId {
        let next = self.value.fetch_add(1, Ordering::Relaxed) + 1;
        ParticipantId::from_raw(next)
    }

    /// Last value handed out (0 if none)
    pub fn current(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }
}
