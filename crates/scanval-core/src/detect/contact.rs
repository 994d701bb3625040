//! Contact detection: e-mail addresses and phone numbers.

use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;

use super::{DetectorState, ValueDetector};
use crate::error::DetectError;
use crate::models::{DetectedValue, DetectionResult, FieldKind};
use crate::progress::{ListenerId, ProgressListener};

lazy_static! {
    static ref EMAIL: Regex =
        Regex::new(r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}").unwrap();

    // Grouped subscriber number with an optional country prefix.
    static ref PHONE: Regex = Regex::new(
        r"(?:\+\d{1,3}[\s\-]?)?(?:\d{3}[\s\-]?\d{3}[\s\-]?\d{3,4}|\d{2}[\s\-]?\d{3}[\s\-]?\d{2}[\s\-]?\d{2})"
    ).unwrap();
}

/// Detector for e-mail addresses and phone numbers.
///
/// Runs two whole-input regex passes rather than a token walk, so progress
/// is reported per pass.
#[derive(Default)]
pub struct ContactDetector {
    state: DetectorState,
}

impl ContactDetector {
    pub fn new() -> Self {
        Self {
            state: DetectorState::new(),
        }
    }

    fn scan(&self, input: &str) -> Result<Vec<DetectionResult>, DetectError> {
        let mut results = Vec::new();

        self.state.check_cancelled()?;
        let mut emails = Vec::new();
        for m in EMAIL.find_iter(input) {
            let result = DetectionResult::new(
                m.as_str(),
                DetectedValue::Email(m.as_str().to_string()),
            );
            if !results.contains(&result) {
                emails.push(result.clone());
                results.push(result);
            }
        }
        self.state.emit(emails, 2, 1);

        self.state.check_cancelled()?;
        let mut phones = Vec::new();
        for m in PHONE.find_iter(input) {
            let normalized: String = m
                .as_str()
                .chars()
                .filter(|c| c.is_ascii_digit() || *c == '+')
                .collect();
            let result =
                DetectionResult::new(m.as_str(), DetectedValue::Phone(normalized));
            if !results.contains(&result) {
                phones.push(result.clone());
                results.push(result);
            }
        }
        self.state.emit(phones, 2, 2);

        Ok(results)
    }
}

impl ValueDetector for ContactDetector {
    fn name(&self) -> &str {
        "contact"
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
        matches!(field, FieldKind::Email | FieldKind::Phone)
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
}
