//! Data model for detection results and configuration.

pub mod config;
pub mod value;

pub use config::{CurrencyConfig, DateConfig, DetectionConfig, IdentifierConfig};
pub use value::{DetectedValue, DetectionResult, FieldKind};
