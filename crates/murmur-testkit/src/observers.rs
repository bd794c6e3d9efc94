//! Observer doubles

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Counts how many times its observers were called
#[derive(Debug, Clone, Default)]
pub struct NotifyCounter {
    hits: Arc<AtomicUsize>,
}

impl NotifyCounter {
    /// Counter starting at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Callback that bumps this counter
    pub fn observer(&self) -> impl Fn() + Send + Sync + 'static {
        let hits = self.hits.clone();
        move || {
            hits.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// Notifications seen so far
    pub fn count(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}
