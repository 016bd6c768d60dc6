//! Height side-channel.
//!
//! Keeps the host informed of the frame's rendered content height,
//! deduplicated against the last reported value. Layout measurement and
//! change observation are behind traits so the tracker is testable without
//! a rendering surface; the embedding binds them to its platform.

use std::sync::{Arc, Mutex, Weak};

use crate::host::HostHandle;

/// Measurements of the frame's rendered layout.
pub trait LayoutProbe: Send + Sync {
    /// Whether the document has rendered enough to be measured. A probe
    /// that is not ready turns height updates into inert no-ops.
    fn is_ready(&self) -> bool;

    /// Document scroll height.
    fn scroll_height(&self) -> u32;

    /// Document offset height.
    fn offset_height(&self) -> u32;

    /// Measured height of the root element.
    fn root_height(&self) -> u32;

    /// Maximum bottom-edge coordinate across laid-out elements. Scroll
    /// height under-reports when children leave normal flow; this term
    /// covers out-of-flow elements extending past the content box.
    fn max_bottom_edge(&self) -> u32;
}

/// Callback fired by the platform when observed layout/content changes.
pub type ObserverCallback = Arc<dyn Fn() + Send + Sync>;

/// An installed observation that can be disconnected.
pub trait ObserverHandle: Send {
    fn disconnect(&mut self);
}

/// Platform hooks for installing layout and content observations.
///
/// Callbacks must not fire from inside `observe_*` itself; delivery starts
/// after registration returns (browser observers already behave this way).
pub trait ObserverHost: Send + Sync {
    /// Observe size changes of the root element.
    fn observe_layout(&self, on_change: ObserverCallback) -> Box<dyn ObserverHandle>;

    /// Observe content mutations under the body (attributes, child list,
    /// subtree, text).
    fn observe_mutations(&self, on_change: ObserverCallback) -> Box<dyn ObserverHandle>;
}

struct TrackerState {
    last_sent: Option<u32>,
    layout_observer: Option<Box<dyn ObserverHandle>>,
    mutation_observer: Option<Box<dyn ObserverHandle>>,
}

/// Observes the frame's layout and reports height changes to the host.
pub struct HeightTracker {
    host: HostHandle,
    probe: Arc<dyn LayoutProbe>,
    observers: Arc<dyn ObserverHost>,
    state: Mutex<TrackerState>,
    /// Self-reference handed to observer callbacks; weak so an installed
    /// observation never keeps a dropped tracker alive.
    weak_self: Weak<HeightTracker>,
}

impl HeightTracker {
    #[must_use]
    pub fn new(
        host: HostHandle,
        probe: Arc<dyn LayoutProbe>,
        observers: Arc<dyn ObserverHost>,
    ) -> Arc<Self> {
        Arc::new_cyclic(|weak_self| Self {
            host,
            probe,
            observers,
            state: Mutex::new(TrackerState {
                last_sent: None,
                layout_observer: None,
                mutation_observer: None,
            }),
            weak_self: weak_self.clone(),
        })
    }

    /// Start observing. Idempotent: observers are installed only when
    /// absent. Performs an immediate update so the host learns the starting
    /// height without waiting for the first change.
    pub fn start(&self) {
        {
            let mut state = self.state.lock().expect("tracker state poisoned");
            if state.layout_observer.is_none() {
                let callback = observer_callback(self.weak_self.clone());
                state.layout_observer = Some(self.observers.observe_layout(callback));
            }
            if state.mutation_observer.is_none() {
                let callback = observer_callback(self.weak_self.clone());
                state.mutation_observer = Some(self.observers.observe_mutations(callback));
            }
        }
        self.force_update(None);
    }

    /// Stop observing. Idempotent: missing handles are skipped.
    pub fn stop(&self) {
        let mut state = self.state.lock().expect("tracker state poisoned");
        if let Some(mut handle) = state.layout_observer.take() {
            handle.disconnect();
        }
        if let Some(mut handle) = state.mutation_observer.take() {
            handle.disconnect();
        }
    }

    /// Whether both observations are currently installed.
    #[must_use]
    pub fn is_active(&self) -> bool {
        let state = self.state.lock().expect("tracker state poisoned");
        state.layout_observer.is_some() && state.mutation_observer.is_some()
    }

    /// Report the frame height to the host. With `None`, recompute the true
    /// rendered height from the probe. Only a value different from the last
    /// sent one goes out; equal values are a no-op. This dedup is what
    /// protects the host from call flooding during layout churn.
    pub fn force_update(&self, height: Option<u32>) {
        let height = match height {
            Some(explicit) => explicit,
            None => match self.measure() {
                Some(measured) => measured,
                None => return,
            },
        };

        let mut state = self.state.lock().expect("tracker state poisoned");
        if state.last_sent == Some(height) {
            return;
        }
        state.last_sent = Some(height);
        drop(state);

        tracing::debug!(height, "reporting frame height");
        self.host.set_height(height);
    }

    /// Last height sent to the host, if any.
    #[must_use]
    pub fn last_sent(&self) -> Option<u32> {
        self.state.lock().expect("tracker state poisoned").last_sent
    }

    fn measure(&self) -> Option<u32> {
        if !self.probe.is_ready() {
            return None;
        }
        let height = self
            .probe
            .scroll_height()
            .max(self.probe.offset_height())
            .max(self.probe.root_height())
            .max(self.probe.max_bottom_edge());
        Some(height)
    }
}

fn observer_callback(tracker: Weak<HeightTracker>) -> ObserverCallback {
    Arc::new(move || {
        if let Some(tracker) = tracker.upgrade() {
            tracker.force_update(None);
        }
    })
}


#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use super::test_support::{CountingObserverHost, StaticProbe};
    use super::*;
    use crate::host::test_support::RecordingCaller;

    fn tracker_with(
        probe: Arc<StaticProbe>,
        observers: Arc<CountingObserverHost>,
    ) -> (Arc<HeightTracker>, Arc<RecordingCaller>) {
        let caller = Arc::new(RecordingCaller::new());
        let host = HostHandle::new(caller.clone());
        let tracker = HeightTracker::new(host, probe, observers);
        (tracker, caller)
    }

    fn sent_heights(caller: &RecordingCaller) -> Vec<u64> {
        caller
            .notifications
            .lock()
            .unwrap()
            .iter()
            .filter(|(method, _)| method == "setHeight")
            .map(|(_, params)| params["height"].as_u64().unwrap())
            .collect()
    }

    #[test]
    fn equal_heights_are_deduplicated() {
        let probe = Arc::new(StaticProbe::with_height(100));
        let observers = Arc::new(CountingObserverHost::new());
        let (tracker, caller) = tracker_with(probe, observers);

        tracker.force_update(Some(100));
        tracker.force_update(Some(100));
        assert_eq!(sent_heights(&caller), vec![100]);

        tracker.force_update(Some(150));
        assert_eq!(sent_heights(&caller), vec![100, 150]);
    }

    #[test]
    fn computed_height_is_max_of_all_probe_terms() {
        let probe = Arc::new(StaticProbe::with_height(100));
        probe.bottom_edge.store(340, Ordering::SeqCst);
        let observers = Arc::new(CountingObserverHost::new());
        let (tracker, caller) = tracker_with(probe, observers);

        tracker.force_update(None);
        assert_eq!(sent_heights(&caller), vec![340]);
    }

    #[test]
    fn unready_document_is_a_no_op() {
        let probe = Arc::new(StaticProbe::with_height(100));
        probe.ready.store(false, Ordering::SeqCst);
        let observers = Arc::new(CountingObserverHost::new());
        let (tracker, caller) = tracker_with(probe, observers);

        tracker.force_update(None);
        assert!(sent_heights(&caller).is_empty());
    }

    #[test]
    fn start_is_idempotent_and_reports_immediately() {
        let probe = Arc::new(StaticProbe::with_height(80));
        let observers = Arc::new(CountingObserverHost::new());
        let (tracker, caller) = tracker_with(probe, Arc::clone(&observers));

        tracker.start();
        tracker.start();
        assert_eq!(observers.active_count(), 2);
        assert!(tracker.is_active());
        assert_eq!(sent_heights(&caller), vec![80]);

        tracker.stop();
        assert_eq!(observers.active_count(), 0);
        assert!(!tracker.is_active());
        tracker.stop();
        assert_eq!(observers.active_count(), 0);
    }

    #[test]
    fn observer_events_recompute_and_dedup() {
        let probe = Arc::new(StaticProbe::with_height(80));
        let observers = Arc::new(CountingObserverHost::new());
        let (tracker, caller) = tracker_with(Arc::clone(&probe), Arc::clone(&observers));

        tracker.start();
        observers.fire_mutation();
        assert_eq!(sent_heights(&caller), vec![80]);

        probe.scroll.store(200, Ordering::SeqCst);
        observers.fire_mutation();
        assert_eq!(sent_heights(&caller), vec![80, 200]);
    }
}
