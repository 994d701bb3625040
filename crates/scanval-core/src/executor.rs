//! Concurrent fan-out/fan-in over a fixed set of detectors.
//!
//! The executor runs every detector over one input on a worker pool sized
//! to the host's parallelism, aggregates their progress streams into one
//! combined stream, and returns a per-detector result map once all
//! detectors have completed. One detection session is live per executor at
//! a time; overlapping `execute` calls are rejected.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::debug;

use crate::detect::ValueDetector;
use crate::error::{ConfigError, DetectError};
use crate::models::DetectionResult;
use crate::progress::{ListenerId, ListenerRegistry, ProgressEvent, ProgressListener};
use crate::sources::{IssueSink, LogIssueSink};

/// Per-session aggregation state. Reset at the start of every `execute`
/// call so nothing leaks across runs.
struct SessionInner {
    word_count: Vec<usize>,
    word_number: Vec<usize>,
    finished: Vec<bool>,
    intermediate: Vec<DetectionResult>,
    results: HashMap<String, Vec<DetectionResult>>,
    finished_dispatched: bool,
}

impl SessionInner {
    fn new(detector_count: usize) -> Self {
        Self {
            word_count: vec![0; detector_count],
            word_number: vec![0; detector_count],
            finished: vec![false; detector_count],
            intermediate: Vec::new(),
            results: HashMap::new(),
            finished_dispatched: false,
        }
    }

    fn reset(&mut self, detector_count: usize) {
        *self = Self::new(detector_count);
    }
}

struct SessionShared {
    inner: Mutex<SessionInner>,
    listeners: ListenerRegistry,
    issues: Arc<dyn IssueSink>,
    active: AtomicBool,
}

impl SessionShared {
    /// Dispatch the aggregated finished notification if every detector has
    /// finished and it has not fired yet for this session.
    fn maybe_dispatch_finished(&self, inner: &mut SessionInner) {
        if !inner.finished_dispatched && inner.finished.iter().all(|f| *f) {
            inner.finished_dispatched = true;
            self.listeners.finish();
        }
    }
}

/// Listener the executor registers on each detector at construction time;
/// folds that detector's events into the session aggregate.
struct AggregatingListener {
    index: usize,
    shared: Arc<SessionShared>,
}

impl ProgressListener for AggregatingListener {
    fn on_progress(&self, event: &ProgressEvent) {
        if !self.shared.active.load(Ordering::SeqCst) {
            return;
        }
        let mut inner = self.shared.inner.lock();

        let previous_count = inner.word_count[self.index];
        let previous_number = inner.word_number[self.index];
        inner.word_count[self.index] = event.word_count;
        inner.word_number[self.index] = event.word_number;

        let total_count: usize = inner.word_count.iter().sum();
        let total_number: usize = inner.word_number.iter().sum();

        if total_number > total_count {
            // A detector emitted an inconsistent event. Drop the update
            // rather than propagate a broken aggregate.
            inner.word_count[self.index] = previous_count;
            inner.word_number[self.index] = previous_number;
            self.shared.issues.report(
                "progress aggregation",
                &format!(
                    "detector #{} reported word number {} above word count {}, update dropped",
                    self.index, event.word_number, event.word_count
                ),
            );
            return;
        }

        inner
            .intermediate
            .extend(event.intermediate_results.iter().cloned());

        // Dispatched under the session lock so observers see a monotone
        // aggregate stream.
        let aggregated =
            ProgressEvent::new(inner.intermediate.clone(), total_count, total_number);
        self.shared.listeners.emit(&aggregated);
    }

    fn on_finished(&self) {
        if !self.shared.active.load(Ordering::SeqCst) {
            return;
        }
        let mut inner = self.shared.inner.lock();
        inner.finished[self.index] = true;
        self.shared.maybe_dispatch_finished(&mut inner);
    }
}

/// Resets the session-active flag when the `execute` future completes or is
/// dropped mid-wait.
struct ActiveGuard {
    shared: Arc<SessionShared>,
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.shared.active.store(false, Ordering::SeqCst);
    }
}

/// Runs a fixed set of detectors concurrently over one input.
pub struct DetectorExecutor {
    detectors: Vec<Arc<dyn ValueDetector>>,
    shared: Arc<SessionShared>,
    permits: Arc<Semaphore>,
}

impl DetectorExecutor {
    /// Executor reporting anomalies through the `tracing` subscriber.
    pub fn new(detectors: Vec<Arc<dyn ValueDetector>>) -> Result<Self, ConfigError> {
        Self::with_issue_sink(detectors, Arc::new(LogIssueSink))
    }

    /// Executor with an explicit anomaly sink.
    pub fn with_issue_sink(
        detectors: Vec<Arc<dyn ValueDetector>>,
        issues: Arc<dyn IssueSink>,
    ) -> Result<Self, ConfigError> {
        for (i, detector) in detectors.iter().enumerate() {
            if detectors[..i].iter().any(|d| d.name() == detector.name()) {
                return Err(ConfigError::DuplicateDetector(detector.name().to_string()));
            }
        }

        let shared = Arc::new(SessionShared {
            inner: Mutex::new(SessionInner::new(detectors.len())),
            listeners: ListenerRegistry::new(),
            issues,
            active: AtomicBool::new(false),
        });

        for (index, detector) in detectors.iter().enumerate() {
            detector.add_progress_listener(Arc::new(AggregatingListener {
                index,
                shared: Arc::clone(&shared),
            }));
        }

        Ok(Self {
            detectors,
            shared,
            permits: Arc::new(Semaphore::new(num_cpus::get())),
        })
    }

    /// The detectors this executor runs, for result filtering via
    /// `supports_field`.
    pub fn detectors(&self) -> &[Arc<dyn ValueDetector>] {
        &self.detectors
    }

    /// Register an observer of the aggregated progress stream. Independent
    /// of any single session.
    pub fn add_listener(&self, listener: Arc<dyn ProgressListener>) -> ListenerId {
        self.shared.listeners.add(listener)
    }

    /// Unregister a previously added observer.
    pub fn remove_listener(&self, id: ListenerId) {
        self.shared.listeners.remove(id)
    }

    /// Run every detector over `input` and wait for all of them.
    ///
    /// Returns the per-detector result lists keyed by detector name. A
    /// detector that fails or is cancelled has no entry; the others still
    /// complete (its error goes to the issue sink). There is no internal
    /// timeout; callers needing a bound race this future with their own
    /// timer. Overlapping calls on one executor are rejected with
    /// [`DetectError::ExecutorBusy`].
    pub async fn execute(
        &self,
        input: &str,
        language_tag: &str,
    ) -> Result<HashMap<String, Vec<DetectionResult>>, DetectError> {
        if self.shared.active.swap(true, Ordering::SeqCst) {
            return Err(DetectError::ExecutorBusy);
        }
        let _guard = ActiveGuard {
            shared: Arc::clone(&self.shared),
        };

        {
            let mut inner = self.shared.inner.lock();
            inner.reset(self.detectors.len());
            // An empty detector set is trivially complete.
            self.shared.maybe_dispatch_finished(&mut inner);
        }

        let mut tasks: JoinSet<(usize, Result<Vec<DetectionResult>, DetectError>)> =
            JoinSet::new();
        for (index, detector) in self.detectors.iter().enumerate() {
            let detector = Arc::clone(detector);
            let permits = Arc::clone(&self.permits);
            let input = input.to_string();
            let language_tag = language_tag.to_string();
            tasks.spawn(async move {
                let _permit = match permits.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => {
                        return (
                            index,
                            Err(DetectError::Interrupted("worker pool closed".to_string())),
                        );
                    }
                };
                let joined = tokio::task::spawn_blocking(move || {
                    detector.fetch_results(&input, &language_tag)
                })
                .await;
                let outcome = match joined {
                    Ok(result) => result,
                    Err(e) => Err(DetectError::Interrupted(format!(
                        "detector task failed: {e}"
                    ))),
                };
                (index, outcome)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            let (index, outcome) = match joined {
                Ok(pair) => pair,
                Err(e) => {
                    self.shared
                        .issues
                        .report("executor", &format!("detector task lost: {e}"));
                    continue;
                }
            };
            let name = self.detectors[index].name();
            match outcome {
                Ok(results) => {
                    debug!(detector = name, count = results.len(), "detector completed");
                    let mut inner = self.shared.inner.lock();
                    inner.results.insert(name.to_string(), results);
                }
                Err(DetectError::Cancelled) => {
                    debug!(detector = name, "detector cancelled");
                }
                Err(e) => {
                    self.shared
                        .issues
                        .report(name, &format!("detection failed: {e}"));
                }
            }
            // A detector that died without its own finished signal must not
            // wedge the session.
            let mut inner = self.shared.inner.lock();
            if !inner.finished[index] {
                inner.finished[index] = true;
                self.shared.maybe_dispatch_finished(&mut inner);
            }
        }

        let results = {
            let mut inner = self.shared.inner.lock();
            std::mem::take(&mut inner.results)
        };
        Ok(results)
    }

    /// Forward a cancellation request to every detector. The `execute`
    /// future unblocks once the detectors honor it and return.
    pub fn cancel_execute(&self) {
        for detector in &self.detectors {
            detector.cancel_fetch();
        }
    }
}
