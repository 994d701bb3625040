//! Date/time detection over token windows.
//!
//! Every window of up to a configured number of tokens is tried against
//! every built-in locale profile, for combined date-time, date-only, and
//! time-only forms, in that preference order. Locale profiles carry chrono
//! format strings ordered short to full; month-name forms for locales
//! chrono cannot parse natively go through per-locale month tables.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use super::{DetectorState, ValueDetector, tokenize, window_count};
use crate::error::{ConfigError, DetectError};
use crate::models::{DateConfig, DetectedValue, DetectionResult, FieldKind};
use crate::progress::{ListenerId, ProgressListener};

struct LocaleProfile {
    tag: &'static str,
    /// Combined forms, tried first.
    datetime_formats: &'static [&'static str],
    /// Date-only forms, short to full.
    date_formats: &'static [&'static str],
    /// Time-only forms.
    time_formats: &'static [&'static str],
    /// Month names for long forms chrono's `%B` does not cover.
    month_names: &'static [(&'static str, u32)],
}

static PROFILES: &[LocaleProfile] = &[
    LocaleProfile {
        tag: "und",
        datetime_formats: &[
            "%Y-%m-%dT%H:%M:%S",
            "%Y-%m-%d %H:%M:%S",
            "%Y-%m-%dT%H:%M",
            "%Y-%m-%d %H:%M",
        ],
        date_formats: &["%Y-%m-%d", "%Y/%m/%d"],
        time_formats: &["%H:%M:%S", "%H:%M"],
        month_names: &[],
    },
    LocaleProfile {
        tag: "en-US",
        datetime_formats: &["%m/%d/%Y %I:%M %p", "%m/%d/%Y %H:%M", "%B %d, %Y %I:%M %p"],
        date_formats: &["%m/%d/%Y", "%m/%d/%y", "%B %d, %Y", "%b %d, %Y"],
        time_formats: &["%I:%M:%S %p", "%I:%M %p"],
        month_names: &[],
    },
    LocaleProfile {
        tag: "en-GB",
        datetime_formats: &["%d/%m/%Y %H:%M", "%d %B %Y %H:%M"],
        date_formats: &["%d/%m/%Y", "%d/%m/%y", "%d %B %Y", "%d %b %Y"],
        time_formats: &["%H:%M:%S", "%H:%M"],
        month_names: &[],
    },
    LocaleProfile {
        tag: "de-DE",
        datetime_formats: &["%d.%m.%Y %H:%M:%S", "%d.%m.%Y %H:%M"],
        date_formats: &["%d.%m.%Y", "%d.%m.%y"],
        time_formats: &["%H:%M:%S", "%H:%M"],
        month_names: &[
            ("januar", 1),
            ("februar", 2),
            ("märz", 3),
            ("april", 4),
            ("mai", 5),
            ("juni", 6),
            ("juli", 7),
            ("august", 8),
            ("september", 9),
            ("oktober", 10),
            ("november", 11),
            ("dezember", 12),
        ],
    },
    LocaleProfile {
        tag: "fr-FR",
        datetime_formats: &["%d/%m/%Y %H:%M"],
        date_formats: &["%d/%m/%Y", "%d/%m/%y"],
        time_formats: &["%H:%M", "%Hh%M"],
        month_names: &[
            ("janvier", 1),
            ("février", 2),
            ("mars", 3),
            ("avril", 4),
            ("mai", 5),
            ("juin", 6),
            ("juillet", 7),
            ("août", 8),
            ("septembre", 9),
            ("octobre", 10),
            ("novembre", 11),
            ("décembre", 12),
        ],
    },
    LocaleProfile {
        tag: "pl-PL",
        datetime_formats: &["%d.%m.%Y %H:%M"],
        date_formats: &["%d.%m.%Y", "%d-%m-%Y", "%d.%m.%y"],
        time_formats: &["%H:%M"],
        month_names: &[
            ("stycznia", 1),
            ("lutego", 2),
            ("marca", 3),
            ("kwietnia", 4),
            ("maja", 5),
            ("czerwca", 6),
            ("lipca", 7),
            ("sierpnia", 8),
            ("września", 9),
            ("października", 10),
            ("listopada", 11),
            ("grudnia", 12),
        ],
    },
];

/// Detector for dates, times, and combined date-times.
pub struct DateDetector {
    state: DetectorState,
    max_window_words: usize,
}

impl DateDetector {
    pub fn new(config: &DateConfig) -> Result<Self, ConfigError> {
        if config.max_window_words == 0 {
            return Err(ConfigError::Validation {
                field: "date.max_window_words".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(Self {
            state: DetectorState::new(),
            max_window_words: config.max_window_words,
        })
    }

    fn scan(&self, input: &str, language_tag: &str) -> Result<Vec<DetectionResult>, DetectError> {
        let tokens = tokenize(input);
        let total = window_count(tokens.len(), self.max_window_words);
        let profiles = profiles_for(language_tag);

        let mut seen: HashSet<DetectionResult> = HashSet::new();
        let mut results = Vec::new();
        let mut examined = 0usize;

        for i in 0..tokens.len() {
            let widest = self.max_window_words.min(tokens.len() - i);
            for width in 1..=widest {
                self.state.check_cancelled()?;

                let text = &input[tokens[i].start..tokens[i + width - 1].end];
                examined += 1;

                let mut fresh = Vec::new();
                for value in parse_window(text, &profiles) {
                    let result = DetectionResult::new(text, value);
                    if seen.insert(result.clone()) {
                        fresh.push(result.clone());
                        results.push(result);
                    }
                }
                self.state.emit(fresh, total, examined);
            }
        }

        Ok(results)
    }
}

impl ValueDetector for DateDetector {
    fn name(&self) -> &str {
        "date"
    }

    fn fetch_results(
        &self,
        input: &str,
        language_tag: &str,
    ) -> Result<Vec<DetectionResult>, DetectError> {
        let outcome = self.scan(input, language_tag);
        self.state.finish();
        outcome
    }

    fn supports_field(&self, field: FieldKind) -> bool {
        matches!(field, FieldKind::Date | FieldKind::Time | FieldKind::DateTime)
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

/// Order the built-in profiles with the caller's language tag first. Every
/// profile is always consulted; the tag only changes priority.
fn profiles_for(language_tag: &str) -> Vec<&'static LocaleProfile> {
    let primary = language_tag
        .split(['-', '_'])
        .next()
        .unwrap_or("")
        .to_ascii_lowercase();

    let mut ordered: Vec<&LocaleProfile> = Vec::with_capacity(PROFILES.len());
    for profile in PROFILES {
        let profile_primary = profile.tag.split('-').next().unwrap_or("");
        if !primary.is_empty() && profile_primary.eq_ignore_ascii_case(&primary) {
            ordered.insert(0, profile);
        } else {
            ordered.push(profile);
        }
    }
    ordered
}

/// Parse one window under every profile. Combined date-times win over
/// date-only parses, which win over time-only parses; within one profile
/// and category the first (shortest) matching style wins. Trailing text
/// after a successful parse is ignored.
fn parse_window(text: &str, profiles: &[&LocaleProfile]) -> Vec<DetectedValue> {
    let mut datetimes: Vec<NaiveDateTime> = Vec::new();
    let mut dates: Vec<NaiveDate> = Vec::new();
    let mut times: Vec<NaiveTime> = Vec::new();

    for profile in profiles {
        for fmt in profile.datetime_formats {
            if let Ok((value, _rest)) = NaiveDateTime::parse_and_remainder(text, fmt) {
                if !datetimes.contains(&value) {
                    datetimes.push(value);
                }
                break;
            }
        }

        let mut date_match = None;
        for fmt in profile.date_formats {
            if let Ok((value, _rest)) = NaiveDate::parse_and_remainder(text, fmt) {
                date_match = Some(value);
                break;
            }
        }
        if date_match.is_none() && !profile.month_names.is_empty() {
            date_match = parse_named_month_date(text, profile.month_names);
        }
        if let Some(value) = date_match {
            if !dates.contains(&value) {
                dates.push(value);
            }
        }

        for fmt in profile.time_formats {
            if let Ok((value, _rest)) = NaiveTime::parse_and_remainder(text, fmt) {
                if !times.contains(&value) {
                    times.push(value);
                }
                break;
            }
        }
    }

    if !datetimes.is_empty() {
        datetimes.into_iter().map(DetectedValue::DateTime).collect()
    } else if !dates.is_empty() {
        dates.into_iter().map(DetectedValue::Date).collect()
    } else {
        times.into_iter().map(DetectedValue::Time).collect()
    }
}

/// Parse a `<day> <month-name> <year>` form using a locale month table,
/// e.g. "15 stycznia 2024" or "15. Januar 2024".
fn parse_named_month_date(text: &str, months: &[(&str, u32)]) -> Option<NaiveDate> {
    let mut parts = text.split_whitespace();
    let day_part = parts.next()?;
    let month_part = parts.next()?;
    let year_part = parts.next()?;

    let day: u32 = day_part.trim_end_matches(['.', ',']).parse().ok()?;
    let month_name = month_part.trim_end_matches(['.', ',']).to_lowercase();
    let month = months
        .iter()
        .find(|(name, _)| *name == month_name)
        .map(|(_, number)| *number)?;
    let year: i32 = year_part
        .trim_end_matches(|c: char| !c.is_ascii_digit())
        .parse()
        .ok()?;
    if year < 1000 {
        return None;
    }

    NaiveDate::from_ymd_opt(year, month, day)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detector() -> DateDetector {
        DateDetector::new(&DateConfig::default()).unwrap()
    }

    fn values_for(results: &[DetectionResult], matched: &str) -> Vec<DetectedValue> {
        results
            .iter()
            .filter(|r| r.matched_text == matched)
            .map(|r| r.value.clone())
            .collect()
    }

    #[test]
    fn test_iso_date() {
        let results = detector().fetch_results("issued 2020-01-01 thanks", "en").unwrap();
        let expected = DetectedValue::Date(NaiveDate::from_ymd_opt(2020, 1, 1).unwrap());
        assert!(values_for(&results, "2020-01-01").contains(&expected));
    }

    #[test]
    fn test_ambiguous_slash_date_yields_both_readings() {
        let results = detector().fetch_results("05/06/2020", "en").unwrap();
        let values = values_for(&results, "05/06/2020");
        assert!(values.contains(&DetectedValue::Date(
            NaiveDate::from_ymd_opt(2020, 5, 6).unwrap()
        )));
        assert!(values.contains(&DetectedValue::Date(
            NaiveDate::from_ymd_opt(2020, 6, 5).unwrap()
        )));
    }

    #[test]
    fn test_combined_wins_over_date_only() {
        let results = detector().fetch_results("2020-01-01 12:30", "en").unwrap();
        let full = values_for(&results, "2020-01-01 12:30");
        let expected = DetectedValue::DateTime(
            NaiveDate::from_ymd_opt(2020, 1, 1)
                .unwrap()
                .and_hms_opt(12, 30, 0)
                .unwrap(),
        );
        assert!(full.contains(&expected));
        assert!(!full.iter().any(|v| matches!(v, DetectedValue::Date(_))));
        // The narrower window still reports the date-only candidate.
        assert!(!values_for(&results, "2020-01-01").is_empty());
    }

    #[test]
    fn test_time_only() {
        let results = detector().fetch_results("at 14:45 sharp", "en").unwrap();
        let expected = DetectedValue::Time(NaiveTime::from_hms_opt(14, 45, 0).unwrap());
        assert!(values_for(&results, "14:45").contains(&expected));
    }

    #[test]
    fn test_polish_month_name() {
        let results = detector().fetch_results("15 stycznia 2024", "pl-PL").unwrap();
        let expected = DetectedValue::Date(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
        assert!(values_for(&results, "15 stycznia 2024").contains(&expected));
    }

    #[test]
    fn test_german_month_name() {
        let results = detector().fetch_results("15. Januar 2024", "de-DE").unwrap();
        let expected = DetectedValue::Date(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
        assert!(values_for(&results, "15. Januar 2024").contains(&expected));
    }

    #[test]
    fn test_trailing_garbage_tolerated() {
        let results = detector().fetch_results("15.01.2024r.", "pl").unwrap();
        let expected = DetectedValue::Date(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
        assert!(values_for(&results, "15.01.2024r.").contains(&expected));
    }

    #[test]
    fn test_empty_input() {
        let results = detector().fetch_results("", "en").unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_no_dates() {
        let results = detector().fetch_results("plain words only here", "en").unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_idempotent() {
        let detector = detector();
        let input = "meeting 05/06/2020 at 14:45, follow-up 15 stycznia 2024";
        let first: HashSet<_> = detector.fetch_results(input, "en").unwrap().into_iter().collect();
        let second: HashSet<_> = detector.fetch_results(input, "en").unwrap().into_iter().collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_zero_window_rejected() {
        let config = DateConfig {
            max_window_words: 0,
        };
        assert!(DateDetector::new(&config).is_err());
    }

    #[test]
    fn test_progress_counts_windows() {
        use crate::progress::{ProgressEvent, ProgressListener};
        use parking_lot::Mutex;

        #[derive(Default)]
        struct Recorder {
            events: Mutex<Vec<(usize, usize)>>,
            finished: Mutex<bool>,
        }

        impl ProgressListener for Recorder {
            fn on_progress(&self, event: &ProgressEvent) {
                self.events.lock().push((event.word_count, event.word_number));
            }

            fn on_finished(&self) {
                *self.finished.lock() = true;
            }
        }

        let detector = detector();
        let recorder = Arc::new(Recorder::default());
        detector.add_progress_listener(recorder.clone());

        detector.fetch_results("one two three four", "en").unwrap();

        let events = recorder.events.lock();
        // 4 tokens, window width 3: 3 + 3 + 2 + 1 windows.
        assert_eq!(events.len(), 9);
        assert!(events.iter().all(|(count, _)| *count == 9));
        let numbers: Vec<usize> = events.iter().map(|(_, n)| *n).collect();
        assert!(numbers.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(*numbers.last().unwrap(), 9);
        assert!(*recorder.finished.lock());
    }
}
