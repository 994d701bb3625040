//! Currency/amount detection.
//!
//! A trie over the store's currency symbols and ISO codes is built once at
//! construction. The scan walks the input token by token and probes four
//! match shapes at each position, each with and without separating
//! whitespace: `<amount><symbol>`, `<symbol><amount>`, `<amount><code>`,
//! `<code><amount>`. Currencies the exchange-rate source does not support
//! are skipped without being reported; per-position parse failures produce
//! no result and never fail the scan.

use std::collections::HashSet;
use std::str::FromStr;
use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::debug;

use super::trie::CurrencyTrie;
use super::{DetectorState, Token, ValueDetector, tokenize};
use crate::error::{ConfigError, DetectError};
use crate::models::{DetectedValue, DetectionResult, FieldKind};
use crate::progress::{ListenerId, ProgressListener};
use crate::sources::{CurrencyStore, ExchangeRateSource};

/// Detector for monetary amounts with a currency symbol or ISO code.
pub struct CurrencyDetector {
    state: DetectorState,
    trie: CurrencyTrie,
    supported: HashSet<String>,
}

impl CurrencyDetector {
    /// Build the detector from the currency store and exchange-rate source.
    /// Either source being unreachable is a fatal construction error.
    pub fn new(
        store: &dyn CurrencyStore,
        rates: &dyn ExchangeRateSource,
    ) -> Result<Self, ConfigError> {
        let currencies = store
            .currencies()
            .map_err(|e| ConfigError::Source(format!("currency store: {e}")))?;
        let supported = rates
            .supported_codes()
            .map_err(|e| ConfigError::Source(format!("exchange-rate source: {e}")))?;

        let mut trie = CurrencyTrie::new();
        for currency in &currencies {
            trie.insert(&currency.symbol, &currency.code);
            trie.insert(&currency.code, &currency.code);
        }

        Ok(Self {
            state: DetectorState::new(),
            trie,
            supported,
        })
    }

    fn scan(&self, input: &str, language_tag: &str) -> Result<Vec<DetectionResult>, DetectError> {
        let tokens = tokenize(input);
        let total = tokens.len();

        let mut seen: HashSet<DetectionResult> = HashSet::new();
        let mut results = Vec::new();

        for (i, token) in tokens.iter().enumerate() {
            self.state.check_cancelled()?;

            let mut fresh = Vec::new();
            let mut record = |matched: &str, amount: Decimal, code: &str| {
                let result = DetectionResult::new(
                    matched,
                    DetectedValue::Amount {
                        amount,
                        currency: code.to_string(),
                    },
                );
                if seen.insert(result.clone()) {
                    fresh.push(result.clone());
                    results.push(result);
                }
            };

            let text = token.text(input);
            self.probe_joined(text, language_tag, &mut record);
            if let Some(next) = tokens.get(i + 1) {
                self.probe_split(input, token, next, language_tag, &mut record);
            }

            self.state.emit(fresh, total, i + 1);
        }

        Ok(results)
    }

    /// Shapes without separating whitespace, inside a single token:
    /// `<amount><unit>` and `<unit><amount>`.
    fn probe_joined(&self, text: &str, language_tag: &str, record: &mut impl FnMut(&str, Decimal, &str)) {
        for (split, _) in text.char_indices().skip(1) {
            let (amount_part, unit_part) = text.split_at(split);
            if let Some(code) = self.trie.get(unit_part) {
                if let Some(amount) = parse_amount(amount_part, language_tag) {
                    if self.is_supported(code) {
                        record(text, amount, code);
                    }
                }
            }
        }

        if let Some((prefix_len, code)) = self.trie.longest_prefix(text) {
            if prefix_len < text.len() {
                if let Some(amount) = parse_amount(&text[prefix_len..], language_tag) {
                    if self.is_supported(code) {
                        record(text, amount, code);
                    }
                }
            }
        }
    }

    /// Shapes with separating whitespace, across two adjacent tokens:
    /// `<amount> <unit>` and `<unit> <amount>`.
    fn probe_split(
        &self,
        input: &str,
        first: &Token,
        second: &Token,
        language_tag: &str,
        record: &mut impl FnMut(&str, Decimal, &str),
    ) {
        let matched = &input[first.start..second.end];
        let first_text = first.text(input);
        let second_text = second.text(input);

        if let Some(code) = self.trie.get(second_text) {
            if let Some(amount) = parse_amount(first_text, language_tag) {
                if self.is_supported(code) {
                    record(matched, amount, code);
                }
            }
        }

        if let Some(code) = self.trie.get(first_text) {
            if let Some(amount) = parse_amount(second_text, language_tag) {
                if self.is_supported(code) {
                    record(matched, amount, code);
                }
            }
        }
    }

    fn is_supported(&self, code: &str) -> bool {
        let supported = self.supported.contains(code);
        if !supported {
            debug!(code, "currency not supported for conversion, skipping match");
        }
        supported
    }
}

impl ValueDetector for CurrencyDetector {
    fn name(&self) -> &str {
        "currency"
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
        matches!(field, FieldKind::Amount)
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

    /// A currency match spans at most two whitespace-delimited tokens.
    fn max_words(&self) -> usize {
        2
    }
}

/// Parse a numeric amount under locale-aware decimal rules: comma or dot as
/// fractional separator, space and NBSP as grouping. The language tag only
/// settles the single-comma ambiguity ("1,234"): English grouping, decimal
/// elsewhere.
pub(crate) fn parse_amount(text: &str, language_tag: &str) -> Option<Decimal> {
    if text.is_empty() {
        return None;
    }
    if !text
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, ',' | '.' | ' ' | '\u{00a0}'))
    {
        return None;
    }
    if !text.starts_with(|c: char| c.is_ascii_digit())
        || !text.ends_with(|c: char| c.is_ascii_digit())
    {
        return None;
    }

    let cleaned: String = text.chars().filter(|c| !matches!(c, ' ' | '\u{00a0}')).collect();
    let commas = cleaned.matches(',').count();
    let dots = cleaned.matches('.').count();

    let normalized = match (commas, dots) {
        (0, 0) => cleaned,
        (1, 0) => {
            let (head, tail) = cleaned.split_once(',').unwrap();
            if tail.len() == 3 && is_english(language_tag) {
                format!("{head}{tail}")
            } else {
                format!("{head}.{tail}")
            }
        }
        (_, 0) => cleaned.replace(',', ""),
        (0, 1) => cleaned,
        (0, _) => cleaned.replace('.', ""),
        // Both separators present: the one appearing last is the decimal
        // separator, the other is grouping.
        (_, _) => {
            let comma_pos = cleaned.rfind(',').unwrap();
            let dot_pos = cleaned.rfind('.').unwrap();
            if comma_pos > dot_pos {
                cleaned.replace('.', "").replace(',', ".")
            } else {
                cleaned.replace(',', "")
            }
        }
    };

    Decimal::from_str(&normalized).ok()
}

fn is_english(language_tag: &str) -> bool {
    language_tag
        .split(['-', '_'])
        .next()
        .is_some_and(|primary| primary.eq_ignore_ascii_case("en"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::{BuiltinCurrencyStore, FixedRateSource, SourceError};

    fn detector() -> CurrencyDetector {
        let store = BuiltinCurrencyStore::new();
        let rates = FixedRateSource::supporting_all(&store).unwrap();
        CurrencyDetector::new(&store, &rates).unwrap()
    }

    fn amount(n: i64, scale: u32, code: &str) -> DetectedValue {
        DetectedValue::Amount {
            amount: Decimal::new(n, scale),
            currency: code.to_string(),
        }
    }

    #[test]
    fn test_amount_then_symbol_joined() {
        let results = detector().fetch_results("paid 5€ today", "en").unwrap();
        assert!(results.contains(&DetectionResult::new("5€", amount(5, 0, "EUR"))));
    }

    #[test]
    fn test_symbol_then_amount_joined() {
        let results = detector().fetch_results("€5", "en").unwrap();
        assert!(results.contains(&DetectionResult::new("€5", amount(5, 0, "EUR"))));
    }

    #[test]
    fn test_code_then_amount_split() {
        let results = detector().fetch_results("EUR 5", "en").unwrap();
        assert!(results.contains(&DetectionResult::new("EUR 5", amount(5, 0, "EUR"))));
    }

    #[test]
    fn test_amount_then_code_split() {
        let results = detector().fetch_results("invoice total 123,45 PLN", "pl").unwrap();
        assert!(results.contains(&DetectionResult::new("123,45 PLN", amount(12345, 2, "PLN"))));
    }

    #[test]
    fn test_multibyte_symbol_suffix() {
        let results = detector().fetch_results("99,99zł", "pl").unwrap();
        assert!(results.contains(&DetectionResult::new("99,99zł", amount(9999, 2, "PLN"))));
    }

    #[test]
    fn test_unsupported_currency_skipped_silently() {
        let store = BuiltinCurrencyStore::new();
        let rates = FixedRateSource::new(["EUR"]);
        let detector = CurrencyDetector::new(&store, &rates).unwrap();

        let results = detector.fetch_results("5€ and 5$", "en").unwrap();
        assert!(results.contains(&DetectionResult::new("5€", amount(5, 0, "EUR"))));
        assert!(!results.iter().any(|r| r.matched_text.contains('$')));
    }

    #[test]
    fn test_overlapping_matches_retained() {
        // "5" pairs with both the preceding code and the following symbol.
        let results = detector().fetch_results("EUR 5 €", "en").unwrap();
        assert!(results.contains(&DetectionResult::new("EUR 5", amount(5, 0, "EUR"))));
        assert!(results.contains(&DetectionResult::new("5 €", amount(5, 0, "EUR"))));
    }

    #[test]
    fn test_plain_number_not_reported() {
        let results = detector().fetch_results("just 500 things", "en").unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_unreachable_store_fails_construction() {
        struct BrokenStore;
        impl CurrencyStore for BrokenStore {
            fn currencies(&self) -> Result<Vec<crate::sources::Currency>, SourceError> {
                Err(SourceError("connection refused".to_string()))
            }
        }

        let rates = FixedRateSource::new(["EUR"]);
        assert!(CurrencyDetector::new(&BrokenStore, &rates).is_err());
    }

    #[test]
    fn test_parse_amount_locale_rules() {
        assert_eq!(parse_amount("1234,56", "pl"), Some(Decimal::new(123456, 2)));
        assert_eq!(parse_amount("1 234,56", "pl"), Some(Decimal::new(123456, 2)));
        assert_eq!(parse_amount("1234.56", "en"), Some(Decimal::new(123456, 2)));
        // Single comma with three trailing digits: grouping in English,
        // decimal elsewhere.
        assert_eq!(parse_amount("1,234", "en-US"), Some(Decimal::new(1234, 0)));
        assert_eq!(parse_amount("1,234", "de"), Some(Decimal::new(1234, 3)));
        // Both separators: last one is the decimal point.
        assert_eq!(parse_amount("1.234,56", "de"), Some(Decimal::new(123456, 2)));
        assert_eq!(parse_amount("1,234.56", "en"), Some(Decimal::new(123456, 2)));
        assert_eq!(parse_amount("12.345.678", "de"), Some(Decimal::new(12345678, 0)));
    }

    #[test]
    fn test_parse_amount_rejects_junk() {
        assert_eq!(parse_amount("", "en"), None);
        assert_eq!(parse_amount("abc", "en"), None);
        assert_eq!(parse_amount("2020-01-01", "en"), None);
        assert_eq!(parse_amount(",50", "en"), None);
        assert_eq!(parse_amount("50,", "en"), None);
    }
}
