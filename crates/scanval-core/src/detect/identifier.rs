//! Identifier detection by edit distance against a known corpus.
//!
//! Every contiguous token window up to a configured width is compared to
//! every known identifier; a window within the configured distance of some
//! identifier is reported, carrying the closest known identifier as its
//! value so callers see the canonical form rather than the OCR garble.
//! This is by far the most expensive detector in the set.

use std::sync::Arc;

use super::distance::levenshtein;
use super::{DetectorState, ValueDetector, tokenize, window_count};
use crate::error::{ConfigError, DetectError};
use crate::models::{DetectedValue, DetectionResult, FieldKind, IdentifierConfig};
use crate::progress::{ListenerId, ProgressListener};
use crate::sources::IdentifierStore;

/// Detector matching input substrings against previously known identifiers.
pub struct IdentifierDetector {
    state: DetectorState,
    store: Arc<dyn IdentifierStore>,
    max_distance: usize,
    max_window_words: usize,
}

impl std::fmt::Debug for IdentifierDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentifierDetector")
            .field("max_distance", &self.max_distance)
            .field("max_window_words", &self.max_window_words)
            .finish_non_exhaustive()
    }
}

impl IdentifierDetector {
    pub fn new(
        store: Arc<dyn IdentifierStore>,
        config: &IdentifierConfig,
    ) -> Result<Self, ConfigError> {
        if config.max_distance < 0 {
            return Err(ConfigError::Validation {
                field: "identifier.max_distance".to_string(),
                reason: format!("must not be negative, got {}", config.max_distance),
            });
        }
        if config.max_window_words == 0 {
            return Err(ConfigError::Validation {
                field: "identifier.max_window_words".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(Self {
            state: DetectorState::new(),
            store,
            max_distance: config.max_distance as usize,
            max_window_words: config.max_window_words,
        })
    }

    fn scan(&self, input: &str) -> Result<Vec<DetectionResult>, DetectError> {
        let corpus = self
            .store
            .known_identifiers()
            .map_err(|e| DetectError::Store(e.to_string()))?;

        let tokens = tokenize(input);
        let total = window_count(tokens.len(), self.max_window_words);

        let mut results = Vec::new();
        let mut examined = 0usize;

        for i in 0..tokens.len() {
            let widest = self.max_window_words.min(tokens.len() - i);
            for width in 1..=widest {
                self.state.check_cancelled()?;

                let candidate = &input[tokens[i].start..tokens[i + width - 1].end];
                examined += 1;

                let mut fresh = Vec::new();
                if let Some(best) = self.closest_match(candidate, &corpus) {
                    let result = DetectionResult::new(
                        candidate,
                        DetectedValue::Identifier(best.to_string()),
                    );
                    if !results.contains(&result) {
                        fresh.push(result.clone());
                        results.push(result);
                    }
                }
                self.state.emit(fresh, total, examined);
            }
        }

        Ok(results)
    }

    /// The known identifier closest to `candidate`, if within the
    /// configured distance. Ties keep the first corpus entry.
    fn closest_match<'a>(&self, candidate: &str, corpus: &'a [String]) -> Option<&'a str> {
        let mut best: Option<(usize, &str)> = None;
        for known in corpus {
            let distance = levenshtein(candidate, known);
            if distance <= self.max_distance
                && best.is_none_or(|(best_distance, _)| distance < best_distance)
            {
                best = Some((distance, known));
            }
        }
        best.map(|(_, known)| known)
    }
}

impl ValueDetector for IdentifierDetector {
    fn name(&self) -> &str {
        "identifier"
    }

    fn fetch_results(
        &self,
        input: &str,
        _language_tag: &str,
    ) -> Result<Vec<DetectionResult>, DetectError> {
        let outcome = self.scan(input);
        self.state.finish();
        outcome
    }

    fn supports_field(&self, field: FieldKind) -> bool {
        matches!(field, FieldKind::Identifier)
    }

    fn cancel_fetch(&self) {
        self.state.cancel();
    }

    fn add_progress_listener(&self, listener: Arc<dyn ProgressListener>) -> ListenerId {
        self.state.add_listener(listener)
    }

    fn remove_progress_listener(&self, id: ListenerId) {
        self.state.remove_listener(id)
    }

    fn max_words(&self) -> usize {
        self.max_window_words
    }
}
