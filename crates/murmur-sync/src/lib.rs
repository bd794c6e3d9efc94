//! # Murmur Sync
//!
//! A piece of state replicated across every participant that joins the same
//! named channel. Any participant can read and write it.
//!
//! ## Protocol
//!
//! - On join, a participant broadcasts `hi`.
//! - A participant holding real state answers `hi` with its current `update`.
//! - A local write mints a fresh version, applies it, then broadcasts `update`.
//! - An incoming `update` is applied when its version differs from the local
//!   one and ignored otherwise.
//!
//! Concurrent writers converge on whichever update each participant receives
//! last. That is last *delivery* wins, not last wall-clock write.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use murmur_sync::{SyncContext, SyncResult};
//! use murmur_transport::MemoryHub;
//!
//! # async fn demo() -> SyncResult<()> {
//! let ctx = SyncContext::new(MemoryHub::new());
//! let a = ctx.join::<String>("settings", None)?;
//! let b = ctx.join::<String>("settings", None)?;
//!
//! b.subscribe(|| println!("b changed")).detach();
//! a.set_state("dark".to_string())?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

pub mod config;
pub mod context;
pub mod error;
pub mod state;
pub mod stats;

pub use config::SyncConfig;
pub use context::{state_broadcast, SyncContext};
pub use error::{SyncError, SyncResult};
pub use state::{Replicable, SharedState};
pub use stats::{SyncStats, SyncStatsSnapshot};

pub use murmur_core::{ChannelName, ParticipantId, Subscription, Version};
