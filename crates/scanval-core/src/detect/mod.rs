//! Value detectors and the capability contract they implement.

pub mod contact;
pub mod currency;
pub mod date;
pub mod distance;
pub mod identifier;
pub mod trie;

pub use contact::ContactDetector;
pub use currency::CurrencyDetector;
pub use date::DateDetector;
pub use identifier::IdentifierDetector;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::DetectError;
use crate::models::{DetectionResult, FieldKind};
use crate::progress::{ListenerId, ListenerRegistry, ProgressEvent, ProgressListener};

/// The capability contract every detector implements.
///
/// A detector is constructed once, with its configuration, and reused
/// across many scans. `fetch_results` is a blocking call meant to run on a
/// worker thread; it streams progress to the registered listeners and
/// signals finished exactly once per call, on success, error, and
/// cancellation alike.
pub trait ValueDetector: Send + Sync {
    /// Stable identity of this detector; unique within one executor.
    fn name(&self) -> &str;

    /// Scan `input` and return every detection candidate found.
    fn fetch_results(
        &self,
        input: &str,
        language_tag: &str,
    ) -> Result<Vec<DetectionResult>, DetectError>;

    /// Whether this detector's results apply to the given field kind.
    fn supports_field(&self, field: FieldKind) -> bool;

    /// Request the in-flight scan (or, if none, the next scan) to stop at
    /// its next safe point. Idempotent; callable from any thread.
    fn cancel_fetch(&self);

    /// Register a progress listener. Listeners added mid-scan receive
    /// subsequent events only.
    fn add_progress_listener(&self, listener: Arc<dyn ProgressListener>) -> ListenerId;

    /// Unregister a previously added listener.
    fn remove_progress_listener(&self, id: ListenerId);

    /// Widest whitespace-delimited token window a single match can span.
    fn max_words(&self) -> usize {
        1
    }
}

/// Cancellation flag and listener bus embedded by every detector.
#[derive(Default)]
pub(crate) struct DetectorState {
    listeners: ListenerRegistry,
    cancelled: AtomicBool,
}

impl DetectorState {
    pub(crate) fn new() -> Self {
        Self {
            listeners: ListenerRegistry::new(),
            cancelled: AtomicBool::new(false),
        }
    }

    pub(crate) fn add_listener(&self, listener: Arc<dyn ProgressListener>) -> ListenerId {
        self.listeners.add(listener)
    }

    pub(crate) fn remove_listener(&self, id: ListenerId) {
        self.listeners.remove(id)
    }

    pub(crate) fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Cancellation checkpoint. Consumes a pending request, so a request
    /// issued while no scan runs cancels exactly one future scan.
    pub(crate) fn check_cancelled(&self) -> Result<(), DetectError> {
        if self.cancelled.swap(false, Ordering::SeqCst) {
            Err(DetectError::Cancelled)
        } else {
            Ok(())
        }
    }

    pub(crate) fn emit(
        &self,
        intermediate_results: Vec<DetectionResult>,
        word_count: usize,
        word_number: usize,
    ) {
        self.listeners
            .emit(&ProgressEvent::new(intermediate_results, word_count, word_number));
    }

    pub(crate) fn finish(&self) {
        self.listeners.finish();
    }
}

/// A whitespace-delimited token, as byte offsets into the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Token {
    pub start: usize,
    pub end: usize,
}

impl Token {
    pub(crate) fn text<'a>(&self, input: &'a str) -> &'a str {
        &input[self.start..self.end]
    }
}

/// Split the input into whitespace-delimited tokens with byte offsets.
pub(crate) fn tokenize(input: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut start = None;
    for (i, c) in input.char_indices() {
        if c.is_whitespace() {
            if let Some(s) = start.take() {
                tokens.push(Token { start: s, end: i });
            }
        } else if start.is_none() {
            start = Some(i);
        }
    }
    if let Some(s) = start {
        tokens.push(Token {
            start: s,
            end: input.len(),
        });
    }
    tokens
}

/// Number of token windows of width 1..=`max_width` over `token_count`
/// tokens.
pub(crate) fn window_count(token_count: usize, max_width: usize) -> usize {
    (0..token_count)
        .map(|i| max_width.min(token_count - i))
        .sum()
}
