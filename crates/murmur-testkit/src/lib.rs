//! # Murmur Testkit
//!
//! Shared helpers for murmur tests: tracing setup, waiting for message
//! delivery to settle, counting observers and spawning groups of peers.

pub mod observers;
pub mod peers;
pub mod timing;

pub use observers::NotifyCounter;
pub use peers::{spawn_peers, PeerGroup};
pub use timing::{settle, wait_until, DEFAULT_SETTLE, DEFAULT_TIMEOUT};

/// Install a fmt subscriber honoring `RUST_LOG`
///
/// Safe to call from every test; only the first call installs anything.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}
