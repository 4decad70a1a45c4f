//! Extraction output records.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Vendor substituted when no vendor pattern matched.
pub const UNKNOWN_VENDOR: &str = "Unknown Vendor";

/// Total substituted when no positive amount was found.
///
/// Downstream storage requires a non-null positive total; pair with a
/// confidence of 0.0 to tell it apart from a real one-cent invoice.
pub const SENTINEL_TOTAL: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Clamp a confidence score into `[0.0, 1.0]`.
pub fn clamp_confidence(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// A field value with its confidence score.
#[derive(Debug, Clone, PartialEq)]
pub struct Scored<T> {
    pub value: T,
    pub confidence: f32,
}

impl<T> Scored<T> {
    pub fn new(value: T, confidence: f32) -> Self {
        Self {
            value,
            confidence: clamp_confidence(confidence),
        }
    }
}

/// Field outcomes before sentinel substitution.
///
/// `None` means the field was not found.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedFields {
    pub vendor: Option<Scored<String>>,
    pub date: Option<Scored<NaiveDate>>,
    pub total: Option<Scored<Decimal>>,
    pub invoice_number: Option<Scored<String>>,
}

/// The eight-field record handed to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub vendor: String,
    pub vendor_confidence: f32,
    /// ISO-8601 calendar date (`YYYY-MM-DD`).
    pub date: Option<String>,
    pub date_confidence: f32,
    pub total: Decimal,
    pub total_confidence: f32,
    pub invoice_number: Option<String>,
    pub invoice_number_confidence: f32,
}

impl ExtractionResult {
    /// The record returned when a document yields no text at all.
    pub fn empty() -> Self {
        ExtractedFields::default().into()
    }

    /// Names of fields whose confidence falls below `threshold`.
    pub fn fields_needing_review(&self, threshold: f32) -> Vec<&'static str> {
        [
            ("vendor", self.vendor_confidence),
            ("date", self.date_confidence),
            ("total", self.total_confidence),
            ("invoice_number", self.invoice_number_confidence),
        ]
        .into_iter()
        .filter(|(_, confidence)| *confidence < threshold)
        .map(|(name, _)| name)
        .collect()
    }
}

impl From<ExtractedFields> for ExtractionResult {
    fn from(fields: ExtractedFields) -> Self {
        let (vendor, vendor_confidence) = match fields.vendor {
            Some(s) if !s.value.trim().is_empty() => (s.value, s.confidence),
            _ => (UNKNOWN_VENDOR.to_string(), 0.0),
        };

        let (date, date_confidence) = match fields.date {
            Some(s) => (Some(s.value.format("%Y-%m-%d").to_string()), s.confidence),
            None => (None, 0.0),
        };

        let (total, total_confidence) = match fields.total {
            Some(s) if s.value > Decimal::ZERO => (s.value, s.confidence),
            _ => (SENTINEL_TOTAL, 0.0),
        };

        let (invoice_number, invoice_number_confidence) = match fields.invoice_number {
            Some(s) => (Some(s.value), s.confidence),
            None => (None, 0.0),
        };

        Self {
            vendor,
            vendor_confidence: clamp_confidence(vendor_confidence),
            date,
            date_confidence: clamp_confidence(date_confidence),
            total,
            total_confidence: clamp_confidence(total_confidence),
            invoice_number,
            invoice_number_confidence: clamp_confidence(invoice_number_confidence),
        }
    }
}
