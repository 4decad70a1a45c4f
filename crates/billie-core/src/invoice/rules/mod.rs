//! Rule-based field extractors for scanned invoices.

pub mod amounts;
pub mod dates;
pub mod invoice_number;
pub mod patterns;
pub mod vendor;

pub use amounts::{parse_amount, TotalExtractor};
pub use dates::{normalize_date, DateExtractor};
pub use invoice_number::InvoiceNumberExtractor;
pub use patterns::PatternRule;
pub use vendor::VendorExtractor;

use std::cmp::Ordering;

use crate::models::result::{clamp_confidence, Scored};
use crate::ocr::TextLine;

/// Trait for field extractors.
pub trait FieldExtractor {
    /// The type of value this extractor produces.
    type Output;

    /// Every scored match inside the field's scan window.
    ///
    /// `full_text` is the space-joined document text, available to rules
    /// that need to see across line boundaries.
    fn candidates(&self, lines: &[TextLine], full_text: &str) -> Vec<Candidate<Self::Output>>;

    /// Pick the winning candidate, or `None` when nothing valid matched.
    fn select(&self, candidates: Vec<Candidate<Self::Output>>) -> Option<Scored<Self::Output>>;

    /// Extract the field from a document's text lines.
    fn extract(&self, lines: &[TextLine], full_text: &str) -> Option<Scored<Self::Output>> {
        self.select(self.candidates(lines, full_text))
    }
}

/// One pattern match for a field, scored before winner selection.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate<T> {
    /// Extracted value.
    pub value: T,
    /// Confidence score (0.0 - 1.0).
    pub confidence: f32,
    /// Index of the rule that matched, or `None` for fallback passes.
    pub rule: Option<usize>,
    /// Index of the source line in the document.
    pub line_index: usize,
    /// The line carries an explicit field keyword.
    pub has_label: bool,
}

impl<T> Candidate<T> {
    pub fn new(value: T, confidence: f32, line_index: usize) -> Self {
        Self {
            value,
            confidence: clamp_confidence(confidence),
            rule: None,
            line_index,
            has_label: false,
        }
    }

    pub fn with_rule(mut self, rule: usize) -> Self {
        self.rule = Some(rule);
        self
    }

    pub fn with_label(mut self, has_label: bool) -> Self {
        self.has_label = has_label;
        self
    }

    pub fn into_scored(self) -> Scored<T> {
        Scored::new(self.value, self.confidence)
    }
}

/// Blend line confidence with rule weight and bonuses, clamped to `[0, 1]`.
pub fn blend(line_confidence: f32, base_weight: f32, positional_bonus: f32, label_bonus: f32) -> f32 {
    clamp_confidence(line_confidence + base_weight + positional_bonus + label_bonus)
}

/// Bonus that decays linearly from `weight` at index 0 to 0 at `window`.
pub fn leading_bonus(index: usize, window: usize, weight: f32) -> f32 {
    if window == 0 {
        return 0.0;
    }
    (window.saturating_sub(index) as f32 / window as f32) * weight
}

/// First `window` lines; a window of 0 covers the whole document.
pub(crate) fn head(lines: &[TextLine], window: usize) -> &[TextLine] {
    if window == 0 {
        lines
    } else {
        &lines[..lines.len().min(window)]
    }
}

/// Last `window` lines; a window of 0 covers the whole document.
pub(crate) fn tail(lines: &[TextLine], window: usize) -> &[TextLine] {
    if window == 0 {
        lines
    } else {
        &lines[lines.len().saturating_sub(window)..]
    }
}

/// Case-insensitive keyword test.
pub fn has_keyword(text: &str, keywords: &[&str]) -> bool {
    let lower = text.to_lowercase();
    keywords.iter().any(|k| lower.contains(k))
}

/// First element that compares greatest; earlier elements win ties.
pub(crate) fn first_max_by<T>(
    items: impl IntoIterator<Item = T>,
    mut compare: impl FnMut(&T, &T) -> Ordering,
) -> Option<T> {
    let mut best: Option<T> = None;
    for item in items {
        match &best {
            Some(current) if compare(&item, current) != Ordering::Greater => {}
            _ => best = Some(item),
        }
    }
    best
}

/// Highest-confidence candidate; the earliest one wins ties.
pub(crate) fn most_confident<T>(candidates: Vec<Candidate<T>>) -> Option<Candidate<T>> {
    first_max_by(candidates, |a, b| a.confidence.total_cmp(&b.confidence))
}
