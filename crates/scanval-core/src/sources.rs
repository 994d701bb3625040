//! Interfaces to external collaborators: currency data, exchange-rate
//! support, the known-identifier corpus, and anomaly reporting.
//!
//! The core never reaches out to the network or disk itself; callers inject
//! implementations of these traits. In-memory defaults are provided so the
//! crate is usable stand-alone and in tests.

use std::collections::HashSet;
use std::fmt;

use parking_lot::RwLock;
use tracing::warn;

/// A currency known to the store: ISO 4217 code plus display symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Currency {
    pub code: String,
    pub symbol: String,
}

impl Currency {
    pub fn new(code: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            symbol: symbol.into(),
        }
    }
}

/// Failure to read an external source.
#[derive(Debug, Clone)]
pub struct SourceError(pub String);

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for SourceError {}

/// Supplies the currencies usable for amount matching.
pub trait CurrencyStore: Send + Sync {
    fn currencies(&self) -> Result<Vec<Currency>, SourceError>;
}

/// Reports which currencies are presently supported for conversion.
pub trait ExchangeRateSource: Send + Sync {
    fn supported_codes(&self) -> Result<HashSet<String>, SourceError>;
}

/// Supplies previously known identifiers for the identifier detector.
pub trait IdentifierStore: Send + Sync {
    fn known_identifiers(&self) -> Result<Vec<String>, SourceError>;
}

/// Sink for anomalies and unexpected detector failures that must not abort
/// the run.
pub trait IssueSink: Send + Sync {
    fn report(&self, context: &str, detail: &str);
}

/// Currency store backed by a fixed table.
pub struct BuiltinCurrencyStore {
    currencies: Vec<Currency>,
}

impl BuiltinCurrencyStore {
    /// Store with a table of common currencies and their symbols.
    pub fn new() -> Self {
        let currencies = [
            ("EUR", "€"),
            ("USD", "$"),
            ("GBP", "£"),
            ("PLN", "zł"),
            ("JPY", "¥"),
            ("CHF", "Fr"),
            ("CZK", "Kč"),
            ("SEK", "kr"),
            ("UAH", "₴"),
            ("INR", "₹"),
        ]
        .into_iter()
        .map(|(code, symbol)| Currency::new(code, symbol))
        .collect();
        Self { currencies }
    }

    /// Store over an explicit currency list.
    pub fn with_currencies(currencies: Vec<Currency>) -> Self {
        Self { currencies }
    }
}

impl Default for BuiltinCurrencyStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CurrencyStore for BuiltinCurrencyStore {
    fn currencies(&self) -> Result<Vec<Currency>, SourceError> {
        Ok(self.currencies.clone())
    }
}

/// Exchange-rate source with a fixed supported set.
pub struct FixedRateSource {
    codes: HashSet<String>,
}

impl FixedRateSource {
    /// Source supporting exactly the given ISO codes.
    pub fn new<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            codes: codes.into_iter().map(Into::into).collect(),
        }
    }

    /// Source supporting every currency of the given store.
    pub fn supporting_all(store: &dyn CurrencyStore) -> Result<Self, SourceError> {
        let codes = store
            .currencies()?
            .into_iter()
            .map(|c| c.code)
            .collect();
        Ok(Self { codes })
    }
}

impl ExchangeRateSource for FixedRateSource {
    fn supported_codes(&self) -> Result<HashSet<String>, SourceError> {
        Ok(self.codes.clone())
    }
}

/// Identifier corpus held in memory; callers may replace the contents
/// between runs.
#[derive(Default)]
pub struct InMemoryIdentifierStore {
    identifiers: RwLock<Vec<String>>,
}

impl InMemoryIdentifierStore {
    pub fn new<I, S>(identifiers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            identifiers: RwLock::new(identifiers.into_iter().map(Into::into).collect()),
        }
    }

    pub fn replace<I, S>(&self, identifiers: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        *self.identifiers.write() = identifiers.into_iter().map(Into::into).collect();
    }
}

impl IdentifierStore for InMemoryIdentifierStore {
    fn known_identifiers(&self) -> Result<Vec<String>, SourceError> {
        Ok(self.identifiers.read().clone())
    }
}

/// Issue sink that reports through the `tracing` subscriber.
#[derive(Default)]
pub struct LogIssueSink;

impl IssueSink for LogIssueSink {
    fn report(&self, context: &str, detail: &str) {
        warn!(context, "{detail}");
    }
}
