//! Factory for participants
//!
//! A [`SyncContext`] owns the transport, the id cursor and the protocol
//! config, so nothing about participant creation hides in process-wide
//! state. [`SyncContext::global`] and [`state_broadcast`] opt back into the
//! process-wide hub and cursor for callers that want one shared medium.

use crate::config::SyncConfig;
use crate::error::SyncResult;
use crate::state::{Replicable, SharedState};
use murmur_core::{ChannelName, IdCursor};
use murmur_transport::{ChannelTransport, MemoryHub};
use once_cell::sync::Lazy;
use std::fmt;
use std::sync::Arc;

static GLOBAL_CONTEXT: Lazy<SyncContext> = Lazy::new(|| {
    SyncContext::new(MemoryHub::global().clone()).with_cursor(IdCursor::global())
});

/// Creates [`SharedState`] participants over one transport
#[derive(Clone)]
pub struct SyncContext {
    transport: Arc<dyn ChannelTransport>,
    cursor: Arc<IdCursor>,
    config: SyncConfig,
}

impl SyncContext {
    /// Context over `transport` with a fresh cursor and default config
    pub fn new(transport: impl ChannelTransport + 'static) -> Self {
        Self::from_shared(Arc::new(transport))
    }

    /// Context over an already shared transport
    pub fn from_shared(transport: Arc<dyn ChannelTransport>) -> Self {
        Self {
            transport,
            cursor: Arc::new(IdCursor::new()),
            config: SyncConfig::default(),
        }
    }

    /// The process-wide context: [`MemoryHub::global`] and [`IdCursor::global`]
    pub fn global() -> &'static SyncContext {
        &GLOBAL_CONTEXT
    }

    /// Replace the protocol config
    pub fn with_config(mut self, config: SyncConfig) -> Self {
        self.config = config;
        self
    }

    /// Share an id cursor with other contexts
    pub fn with_cursor(mut self, cursor: Arc<IdCursor>) -> Self {
        self.cursor = cursor;
        self
    }

    /// Protocol config used for new participants
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Id cursor used for new participants
    pub fn cursor(&self) -> &Arc<IdCursor> {
        &self.cursor
    }

    /// Join `channel` with an optional seed value
    pub fn join<T: Replicable>(
        &self,
        channel: &str,
        initial: Option<T>,
    ) -> SyncResult<SharedState<T>> {
        self.join_channel(ChannelName::new(channel)?, initial)
    }

    /// Join an already validated channel name
    pub fn join_channel<T: Replicable>(
        &self,
        channel: ChannelName,
        initial: Option<T>,
    ) -> SyncResult<SharedState<T>> {
        SharedState::join(
            self.transport.as_ref(),
            &self.cursor,
            self.config.clone(),
            channel,
            initial,
        )
    }
}

impl fmt::Debug for SyncContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncContext")
            .field("guarantees", &self.transport.guarantees())
            .field("cursor", &self.cursor)
            .field("config", &self.config)
            .finish()
    }
}

/// Join `channel` through the process-wide context
pub fn state_broadcast<T: Replicable>(
    channel: &str,
    initial: Option<T>,
) -> SyncResult<SharedState<T>> {
    SyncContext::global().join(channel, initial)
}
