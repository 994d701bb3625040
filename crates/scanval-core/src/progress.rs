//! Progress events and the listener bus shared by detectors and the executor.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use crate::models::DetectionResult;

/// A snapshot of scanning progress.
///
/// `word_count` is the total number of units the emitter will examine and
/// `word_number` how many it has examined so far. `intermediate_results`
/// carries only the results found since the previous event; consumers that
/// want the full set accumulate them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressEvent {
    pub intermediate_results: Vec<DetectionResult>,
    pub word_count: usize,
    pub word_number: usize,
}

impl ProgressEvent {
    pub fn new(
        intermediate_results: Vec<DetectionResult>,
        word_count: usize,
        word_number: usize,
    ) -> Self {
        Self {
            intermediate_results,
            word_count,
            word_number,
        }
    }
}

/// Observer of a detection run.
///
/// `on_finished` is delivered exactly once per run, after the final
/// `on_progress` call, on success and failure alike.
pub trait ProgressListener: Send + Sync {
    fn on_progress(&self, event: &ProgressEvent);

    fn on_finished(&self) {}
}

/// Handle returned by listener registration, used to unregister.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Registration set for progress listeners.
///
/// Registration and removal may race an active scan; a listener added
/// mid-scan receives subsequent events but no replay of earlier ones.
#[derive(Default)]
pub struct ListenerRegistry {
    listeners: Mutex<Vec<(ListenerId, Arc<dyn ProgressListener>)>>,
    next_id: AtomicU64,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, listener: Arc<dyn ProgressListener>) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners.lock().push((id, listener));
        id
    }

    pub fn remove(&self, id: ListenerId) {
        self.listeners.lock().retain(|(lid, _)| *lid != id);
    }

    /// Deliver a progress event to every registered listener.
    ///
    /// Dispatch iterates a snapshot of the registration set, so a listener
    /// may unregister itself (or others) from within the callback.
    pub fn emit(&self, event: &ProgressEvent) {
        for listener in self.snapshot() {
            listener.on_progress(event);
        }
    }

    /// Deliver the terminal finished signal to every registered listener.
    pub fn finish(&self) {
        for listener in self.snapshot() {
            listener.on_finished();
        }
    }

    fn snapshot(&self) -> Vec<Arc<dyn ProgressListener>> {
        self.listeners
            .lock()
            .iter()
            .map(|(_, l)| Arc::clone(l))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    struct Counter {
        events: AtomicUsize,
        finishes: AtomicUsize,
    }

    impl Counter {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                events: AtomicUsize::new(0),
                finishes: AtomicUsize::new(0),
            })
        }
    }

    impl ProgressListener for Counter {
        fn on_progress(&self, _event: &ProgressEvent) {
            self.events.fetch_add(1, Ordering::SeqCst);
        }

        fn on_finished(&self) {
            self.finishes.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_emit_reaches_all_listeners() {
        let registry = ListenerRegistry::new();
        let a = Counter::new();
        let b = Counter::new();
        registry.add(a.clone());
        registry.add(b.clone());

        registry.emit(&ProgressEvent::new(Vec::new(), 10, 1));
        registry.finish();

        assert_eq!(a.events.load(Ordering::SeqCst), 1);
        assert_eq!(b.events.load(Ordering::SeqCst), 1);
        assert_eq!(a.finishes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_removed_listener_receives_nothing() {
        let registry = ListenerRegistry::new();
        let a = Counter::new();
        let id = registry.add(a.clone());
        registry.remove(id);

        registry.emit(&ProgressEvent::new(Vec::new(), 1, 1));
        assert_eq!(a.events.load(Ordering::SeqCst), 0);
    }
}
