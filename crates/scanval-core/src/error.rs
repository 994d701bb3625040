//! Error types for the scanval-core library.

use thiserror::Error;

/// Main error type for the scanval library.
#[derive(Error, Debug)]
pub enum ScanvalError {
    /// Detector or executor configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Detection run error.
    #[error("detection error: {0}")]
    Detect(#[from] DetectError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while constructing detectors or the executor.
///
/// These are fatal: an invalid configuration is never silently corrected.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A configuration value failed validation.
    #[error("validation failed for {field}: {reason}")]
    Validation { field: String, reason: String },

    /// An external source required at construction could not be read.
    #[error("source unavailable: {0}")]
    Source(String),

    /// Two detectors in one executor share a name.
    #[error("duplicate detector name: {0}")]
    DuplicateDetector(String),
}

/// Errors raised while fetching detection results.
#[derive(Error, Debug)]
pub enum DetectError {
    /// The scan observed a cancellation request and stopped.
    #[error("detection cancelled")]
    Cancelled,

    /// An external store could not be read during the scan.
    #[error("store error: {0}")]
    Store(String),

    /// An `execute` call overlapped a run already in flight.
    #[error("executor busy: a detection run is already in flight")]
    ExecutorBusy,

    /// The wait for detector completion was interrupted.
    #[error("detection interrupted: {0}")]
    Interrupted(String),
}

/// Result type for the scanval library.
pub type Result<T> = std::result::Result<T, ScanvalError>;
