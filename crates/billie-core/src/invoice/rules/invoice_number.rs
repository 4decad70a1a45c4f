//! Invoice number extraction.

use crate::models::config::{ExtractionConfig, FieldScoring};
use crate::models::result::Scored;
use crate::ocr::TextLine;

use super::patterns::{INVOICE_NUMBER_KEYWORDS, INVOICE_NUMBER_RULES};
use super::{blend, has_keyword, head, leading_bonus, most_confident, Candidate, FieldExtractor};

/// Invoice number extractor.
pub struct InvoiceNumberExtractor {
    scoring: FieldScoring,
    min_digits: usize,
}

impl InvoiceNumberExtractor {
    pub fn new(config: &ExtractionConfig) -> Self {
        Self {
            scoring: config.invoice_number,
            min_digits: config.invoice_number_min_digits,
        }
    }

    /// An identifier must contain a digit; a purely numeric one must be at
    /// least `min_digits` long.
    fn is_plausible(&self, value: &str) -> bool {
        if !value.chars().any(|c| c.is_ascii_digit()) {
            return false;
        }
        if value.chars().all(|c| c.is_ascii_digit()) {
            return value.len() >= self.min_digits;
        }
        true
    }
}

impl Default for InvoiceNumberExtractor {
    fn default() -> Self {
        Self::new(&ExtractionConfig::default())
    }
}

impl FieldExtractor for InvoiceNumberExtractor {
    type Output = String;

    fn candidates(&self, lines: &[TextLine], _full_text: &str) -> Vec<Candidate<String>> {
        let mut candidates = Vec::new();

        for (i, line) in head(lines, self.scoring.window).iter().enumerate() {
            let has_label = has_keyword(&line.text, INVOICE_NUMBER_KEYWORDS);
            let label_bonus = if has_label { self.scoring.label_bonus } else { 0.0 };
            let position_bonus = leading_bonus(i, self.scoring.window, self.scoring.position_weight);

            for (rule_index, rule) in INVOICE_NUMBER_RULES.iter().enumerate() {
                let Some(value) = rule.captures(&line.text).find(|v| self.is_plausible(v)) else {
                    continue;
                };
                let confidence = blend(line.confidence, rule.base_weight, position_bonus, label_bonus);
                candidates.push(
                    Candidate::new(value.to_string(), confidence, i)
                        .with_rule(rule_index)
                        .with_label(has_label),
                );
            }
        }

        candidates
    }

    fn select(&self, candidates: Vec<Candidate<String>>) -> Option<Scored<String>> {
        most_confident(candidates).map(Candidate::into_scored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invoice::rules::tests::lines;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_labeled_invoice_number() {
        let doc = lines(&["ACME CORP", "Invoice Number: INV-2024-001"], 0.8);
        let number = InvoiceNumberExtractor::default().extract(&doc, "").unwrap();

        assert_eq!(number.value, "INV-2024-001");
        assert!(number.confidence <= 1.0);
    }

    #[test]
    fn test_short_numeric_value_rejected() {
        let doc = lines(&["Invoice # 42"], 0.9);
        assert!(InvoiceNumberExtractor::default().extract(&doc, "").is_none());
    }

    #[test]
    fn test_numeric_value_with_enough_digits() {
        let doc = lines(&["Invoice No. 20931"], 0.7);
        let number = InvoiceNumberExtractor::default().extract(&doc, "").unwrap();
        assert_eq!(number.value, "20931");
    }

    #[test]
    fn test_label_words_never_captured() {
        let doc = lines(&["Invoice Number", "Reference"], 0.9);
        assert!(InvoiceNumberExtractor::default().candidates(&doc, "").is_empty());
    }

    #[test]
    fn test_bare_code_without_label() {
        let doc = lines(&["Order AB-123456 shipped"], 0.5);
        let number = InvoiceNumberExtractor::default().extract(&doc, "").unwrap();

        assert_eq!(number.value, "AB-123456");
        // 0.5 line + 0.15 rule + 0.05 position
        assert!((number.confidence - 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_later_match_on_line_is_used() {
        let doc = lines(&["Invoice for services, INV: 7781"], 0.6);
        let number = InvoiceNumberExtractor::default().extract(&doc, "").unwrap();
        assert_eq!(number.value, "7781");
    }

    #[test]
    fn test_window_limits_scan() {
        let mut texts = vec!["-"; 40];
        texts.push("Invoice #A-10023");
        let doc = lines(&texts, 0.9);
        assert!(InvoiceNumberExtractor::default().extract(&doc, "").is_none());
    }
}
