//! Configuration structures for the detection pipeline.

use serde::{Deserialize, Serialize};

/// Main configuration for the scanval detectors.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Date detector configuration.
    pub date: DateConfig,

    /// Currency detector configuration.
    pub currency: CurrencyConfig,

    /// Identifier detector configuration.
    pub identifier: IdentifierConfig,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            date: DateConfig::default(),
            currency: CurrencyConfig::default(),
            identifier: IdentifierConfig::default(),
        }
    }
}

/// Date detector configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DateConfig {
    /// Widest token window tried when parsing date expressions.
    pub max_window_words: usize,
}

impl Default for DateConfig {
    fn default() -> Self {
        Self {
            max_window_words: 3,
        }
    }
}

/// Currency detector configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CurrencyConfig {
    /// ISO codes accepted for conversion. Empty = accept every currency the
    /// store knows.
    pub supported_codes: Vec<String>,
}

impl Default for CurrencyConfig {
    fn default() -> Self {
        Self {
            supported_codes: Vec::new(),
        }
    }
}

/// Identifier detector configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentifierConfig {
    /// Maximum edit distance between a candidate and a known identifier.
    /// Validated at detector construction; negative values are rejected.
    pub max_distance: i64,

    /// Widest token window tried as an identifier candidate.
    pub max_window_words: usize,
}

impl Default for IdentifierConfig {
    fn default() -> Self {
        Self {
            max_distance: 20,
            max_window_words: 3,
        }
    }
}

impl DetectionConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))?;
        std::fs::write(path, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_threshold() {
        let config = DetectionConfig::default();
        assert_eq!(config.identifier.max_distance, 20);
    }

    #[test]
    fn test_roundtrip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = DetectionConfig::default();
        config.identifier.max_distance = 5;
        config.currency.supported_codes = vec!["EUR".to_string(), "PLN".to_string()];
        config.save(&path).unwrap();

        let loaded = DetectionConfig::from_file(&path).unwrap();
        assert_eq!(loaded.identifier.max_distance, 5);
        assert_eq!(loaded.currency.supported_codes.len(), 2);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let parsed: DetectionConfig =
            serde_json::from_str(r#"{"identifier": {"max_distance": 2}}"#).unwrap();
        assert_eq!(parsed.identifier.max_distance, 2);
        assert_eq!(parsed.identifier.max_window_words, 3);
        assert_eq!(parsed.date.max_window_words, 3);
    }
}
