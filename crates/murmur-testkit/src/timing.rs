//! Waiting for asynchronous delivery

use std::time::Duration;

/// How long [`settle`] waits
pub const DEFAULT_SETTLE: Duration = Duration::from_millis(25);

/// Upper bound used by tests that call [`wait_until`]
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);

const POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Give spawned receive loops time to drain their inboxes
///
/// Use for negative checks ("nothing happened"); prefer [`wait_until`] when
/// waiting for something to happen.
pub async fn settle() {
    tokio::time::sleep(DEFAULT_SETTLE).await;
}

/// Poll `condition` until it holds or `timeout` elapses
///
/// Returns whether the condition held.
pub async fn wait_until<F>(timeout: Duration, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if condition() {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}
