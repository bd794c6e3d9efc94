//! Versioned cell with local change notification
//!
//! A [`VersionedCell`] holds the replicated value together with the
//! [`Version`] of the assignment that produced it. Every assignment runs all
//! registered observers synchronously, in registration order, after the
//! cell's lock has been released.

use crate::identifiers::Version;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

/// Change callback. Invoked with no arguments; read the cell to get the value.
pub type Observer = Arc<dyn Fn() + Send + Sync>;

type ObserverMap = Mutex<BTreeMap<u64, Observer>>;

#[derive(Debug)]
struct CellState<T> {
    value: Option<T>,
    version: Version,
}

struct CellInner<T> {
    state: Mutex<CellState<T>>,
    observers: Arc<ObserverMap>,
    next_observer: AtomicU64,
}

/// Value plus version marker, shared by clone
pub struct VersionedCell<T> {
    inner: Arc<CellInner<T>>,
}

impl<T> Clone for VersionedCell<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for VersionedCell<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("VersionedCell")
            .field("value", &state.value)
            .field("version", &state.version)
            .field("observers", &self.inner.observers.lock().len())
            .finish()
    }
}

impl<T: Clone> VersionedCell<T> {
    /// Create a cell holding `initial` under the sentinel version
    pub fn new(initial: Option<T>) -> Self {
        Self::with_version(initial, Version::initial())
    }

    /// Create a cell with an explicit starting version
    pub fn with_version(initial: Option<T>, version: Version) -> Self {
        Self {
            inner: Arc::new(CellInner {
                state: Mutex::new(CellState {
                    value: initial,
                    version,
                }),
                observers: Arc::new(Mutex::new(BTreeMap::new())),
                next_observer: AtomicU64::new(0),
            }),
        }
    }

    /// Register an observer
    ///
    /// The same callback registered twice is notified twice. Dropping the
    /// returned [`Subscription`] removes the observer; call
    /// [`Subscription::detach`] to keep it for the cell's lifetime.
    pub fn subscribe<F>(&self, observer: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        let key = self.inner.next_observer.fetch_add(1, Ordering::Relaxed);
        self.inner.observers.lock().insert(key, Arc::new(observer));
        Subscription {
            observers: Arc::downgrade(&self.inner.observers),
            key,
            detached: false,
        }
    }

    /// Current value
    pub fn get_snapshot(&self) -> Option<T> {
        self.inner.state.lock().value.clone()
    }

    /// Current version marker
    pub fn version(&self) -> Version {
        self.inner.state.lock().version.clone()
    }

    /// Value and version read under a single lock
    pub fn snapshot_with_version(&self) -> (Option<T>, Version) {
        let state = self.inner.state.lock();
        (state.value.clone(), state.version.clone())
    }

    /// Replace value and version unconditionally, then notify observers
    pub fn set_snapshot(&self, value: Option<T>, version: Version) {
        {
            let mut state = self.inner.state.lock();
            state.value = value;
            state.version = version;
        }
        self.notify();
    }

    /// Replace and notify only when `version` differs from the held one
    ///
    /// The comparison and the assignment happen under the same lock. Returns
    /// whether the cell changed.
    pub fn apply_if_newer(&self, value: T, version: Version) -> bool {
        {
            let mut state = self.inner.state.lock();
            if state.version == version {
                return false;
            }
            state.value = Some(value);
            state.version = version;
        }
        self.notify();
        true
    }

    /// Number of registered observers
    pub fn observer_count(&self) -> usize {
        self.inner.observers.lock().len()
    }

    fn notify(&self) {
        let observers: Vec<(u64, Observer)> = self
            .inner
            .observers
            .lock()
            .iter()
            .map(|(key, observer)| (*key, observer.clone()))
            .collect();

        for (key, observer) in observers {
            if catch_unwind(AssertUnwindSafe(|| observer())).is_err() {
                tracing::error!(observer = key, "Observer panicked during notification");
            }
        }
    }
}

/// Handle that removes an observer from its cell
#[must_use = "dropping a Subscription unsubscribes the observer; call detach() to keep it"]
pub struct Subscription {
    observers: Weak<ObserverMap>,
    key: u64,
    detached: bool,
}

impl Subscription {
    /// Remove the observer now
    pub fn unsubscribe(self) {
        drop(self);
    }

    /// Keep the observer registered for as long as the cell lives
    pub fn detach(mut self) {
        self.detached = true;
    }

    fn remove(&self) {
        if let Some(observers) = self.observers.upgrade() {
            observers.lock().remove(&self.key);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if !self.detached {
            self.remove();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("key", &self.key)
            .field("detached", &self.detached)
            .finish()
    }
}
