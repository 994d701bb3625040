//! Core library for scanned-document value detection.
//!
//! This crate provides:
//! - The detector capability contract and the built-in detectors
//!   (dates/times, currency amounts, known identifiers, contacts)
//! - A concurrent executor that fans all selected detectors out over one
//!   input and aggregates their progress and results
//! - Interfaces to the external collaborators (currency store,
//!   exchange-rate source, identifier corpus, issue reporting)

pub mod detect;
pub mod error;
pub mod executor;
pub mod models;
pub mod progress;
pub mod sources;

pub use detect::{
    ContactDetector, CurrencyDetector, DateDetector, IdentifierDetector, ValueDetector,
};
pub use error::{ConfigError, DetectError, Result, ScanvalError};
pub use executor::DetectorExecutor;
pub use models::{
    DetectedValue, DetectionConfig, DetectionResult, FieldKind, IdentifierConfig,
};
pub use progress::{ListenerId, ProgressEvent, ProgressListener};
pub use sources::{
    BuiltinCurrencyStore, Currency, CurrencyStore, ExchangeRateSource, FixedRateSource,
    IdentifierStore, InMemoryIdentifierStore, IssueSink, LogIssueSink, SourceError,
};
