//! Value types produced by detection.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A typed value parsed out of recognized text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DetectedValue {
    /// A calendar date.
    Date(NaiveDate),
    /// A wall-clock time.
    Time(NaiveTime),
    /// A combined date and time.
    DateTime(NaiveDateTime),
    /// A monetary amount in a specific currency (ISO 4217 code).
    Amount { amount: Decimal, currency: String },
    /// A known identifier (document number, customer id, ...).
    Identifier(String),
    /// An e-mail address.
    Email(String),
    /// A phone number.
    Phone(String),
}

impl DetectedValue {
    /// The field kind this value can fill.
    pub fn kind(&self) -> FieldKind {
        match self {
            DetectedValue::Date(_) => FieldKind::Date,
            DetectedValue::Time(_) => FieldKind::Time,
            DetectedValue::DateTime(_) => FieldKind::DateTime,
            DetectedValue::Amount { .. } => FieldKind::Amount,
            DetectedValue::Identifier(_) => FieldKind::Identifier,
            DetectedValue::Email(_) => FieldKind::Email,
            DetectedValue::Phone(_) => FieldKind::Phone,
        }
    }
}

/// Kind of structured field a detection result can be offered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldKind {
    Date,
    Time,
    DateTime,
    Amount,
    Identifier,
    Email,
    Phone,
}

/// A single detection candidate: the exact input substring that matched and
/// the value it was parsed into.
///
/// Equality covers both fields, so the same value found at a different
/// offset (different matched text) is a distinct result.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DetectionResult {
    /// The exact substring of the input that produced the value.
    pub matched_text: String,
    /// The parsed value.
    pub value: DetectedValue,
}

impl DetectionResult {
    pub fn new(matched_text: impl Into<String>, value: DetectedValue) -> Self {
        Self {
            matched_text: matched_text.into(),
            value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_equality_covers_both_fields() {
        let date = DetectedValue::Date(NaiveDate::from_ymd_opt(2020, 1, 1).unwrap());
        let a = DetectionResult::new("2020-01-01", date.clone());
        let b = DetectionResult::new("2020-01-01", date.clone());
        let c = DetectionResult::new("01.01.2020", date);

        assert_eq!(a, b);
        assert_ne!(a, c);

        let mut set = HashSet::new();
        set.insert(a);
        set.insert(b);
        set.insert(c);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_amount_equality_ignores_scale() {
        let five = DetectionResult::new(
            "5€",
            DetectedValue::Amount {
                amount: Decimal::new(5, 0),
                currency: "EUR".to_string(),
            },
        );
        let five_scaled = DetectionResult::new(
            "5€",
            DetectedValue::Amount {
                amount: Decimal::new(500, 2),
                currency: "EUR".to_string(),
            },
        );
        assert_eq!(five, five_scaled);
    }

    #[test]
    fn test_value_kind() {
        let value = DetectedValue::Amount {
            amount: Decimal::new(100, 2),
            currency: "PLN".to_string(),
        };
        assert_eq!(value.kind(), FieldKind::Amount);
    }
}
