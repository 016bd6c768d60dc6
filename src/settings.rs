//! Host-pushed settings cell.
//!
//! One mutable cell holding the latest snapshot, plus at most one change
//! listener. Registering a listener replaces the previous one; nothing is
//! queued. Change notifications are applied in arrival order.

use std::sync::Mutex;

use crate::mode::Mode;
use crate::model::Snapshot;

/// Callback invoked with every snapshot pushed after registration.
pub type ChangeListener = Box<dyn Fn(Snapshot) + Send + Sync>;

/// Single mutable cell for the latest `{mode, ...properties}` snapshot.
pub struct SettingsStore {
    current: Mutex<Snapshot>,
    listener: Mutex<Option<ChangeListener>>,
}

impl SettingsStore {
    /// Create the store from the handshake snapshot.
    #[must_use]
    pub fn new(initial: Snapshot) -> Self {
        Self {
            current: Mutex::new(initial),
            listener: Mutex::new(None),
        }
    }

    /// Latest snapshot.
    #[must_use]
    pub fn current(&self) -> Snapshot {
        self.current.lock().expect("settings cell poisoned").clone()
    }

    /// Mode fixed at session start.
    #[must_use]
    pub fn mode(&self) -> Mode {
        self.current
            .lock()
            .expect("settings cell poisoned")
            .mode
            .clone()
    }

    /// Install the change listener, replacing any previous one.
    ///
    /// The listener is invoked with the `listener` slot held; it must not
    /// re-register from within its own body.
    pub fn set_listener(&self, listener: ChangeListener) {
        let mut slot = self.listener.lock().expect("listener slot poisoned");
        *slot = Some(listener);
    }

    /// Drop the change listener, if any.
    pub fn clear_listener(&self) {
        let mut slot = self.listener.lock().expect("listener slot poisoned");
        *slot = None;
    }

    /// Store a freshly pushed snapshot, then notify the listener.
    pub fn push(&self, snapshot: Snapshot) {
        {
            let mut current = self.current.lock().expect("settings cell poisoned");
            *current = snapshot.clone();
        }
        let slot = self.listener.lock().expect("listener slot poisoned");
        if let Some(listener) = slot.as_ref() {
            listener(snapshot);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use serde_json::Map;

    use super::*;

    fn snapshot(mode: Mode) -> Snapshot {
        Snapshot::new(mode, Map::new())
    }

    #[test]
    fn push_updates_cell_and_notifies_listener() {
        let store = SettingsStore::new(snapshot(Mode::RenderPage));
        let seen = Arc::new(AtomicUsize::new(0));
        let seen_in_listener = Arc::clone(&seen);
        store.set_listener(Box::new(move |snap| {
            assert_eq!(snap.mode, Mode::RenderPage);
            seen_in_listener.fetch_add(1, Ordering::SeqCst);
        }));

        store.push(snapshot(Mode::RenderPage));
        store.push(snapshot(Mode::RenderPage));
        assert_eq!(seen.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn registering_replaces_previous_listener() {
        let store = SettingsStore::new(snapshot(Mode::RenderPage));
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));

        let first_counter = Arc::clone(&first);
        store.set_listener(Box::new(move |_| {
            first_counter.fetch_add(1, Ordering::SeqCst);
        }));
        let second_counter = Arc::clone(&second);
        store.set_listener(Box::new(move |_| {
            second_counter.fetch_add(1, Ordering::SeqCst);
        }));

        store.push(snapshot(Mode::RenderPage));
        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn push_without_listener_still_updates_cell() {
        let store = SettingsStore::new(snapshot(Mode::RenderPage));
        store.push(snapshot(Mode::Unsupported("x".to_string())));
        assert_eq!(store.mode(), Mode::Unsupported("x".to_string()));
    }
}
