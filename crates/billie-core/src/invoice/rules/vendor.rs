//! Vendor name extraction.
//!
//! Scans the top of the document for company-looking names. When no rule
//! matches, falls back to the most prominent plain capitalized line.

use crate::models::config::{ExtractionConfig, FieldScoring, VendorFallback};
use crate::models::result::Scored;
use crate::ocr::TextLine;

use super::patterns::{VENDOR_BOILERPLATE, VENDOR_FALLBACK_LINE, VENDOR_RULES, VENDOR_STOP_LINES};
use super::{blend, has_keyword, head, leading_bonus, most_confident, Candidate, FieldExtractor};

/// Vendor name extractor.
pub struct VendorExtractor {
    scoring: FieldScoring,
    fallback: VendorFallback,
}

impl VendorExtractor {
    pub fn new(config: &ExtractionConfig) -> Self {
        Self {
            scoring: config.vendor,
            fallback: config.vendor_fallback.clone(),
        }
    }

    fn rule_candidates(&self, lines: &[TextLine]) -> Vec<Candidate<String>> {
        let mut candidates = Vec::new();

        for (i, line) in head(lines, self.scoring.window).iter().enumerate() {
            let text = line.text.trim();
            if text.chars().count() < 3 || is_stop_line(text) {
                continue;
            }

            let bonus = leading_bonus(i, self.scoring.window, self.scoring.position_weight);

            for (rule_index, rule) in VENDOR_RULES.iter().enumerate() {
                if let Some(name) = rule.capture(text).map(collapse_whitespace) {
                    if name.is_empty() {
                        continue;
                    }
                    let confidence = blend(line.confidence, rule.base_weight, bonus, 0.0);
                    candidates.push(Candidate::new(name, confidence, i).with_rule(rule_index));
                }
            }
        }

        candidates
    }

    /// Plain capitalized lines near the top, free of invoice boilerplate.
    fn fallback_candidates(&self, lines: &[TextLine]) -> Vec<Candidate<String>> {
        let fb = &self.fallback;

        head(lines, fb.window)
            .iter()
            .enumerate()
            .filter_map(|(i, line)| {
                let text = line.text.trim();
                let len = text.chars().count();
                if len < fb.min_len || len > fb.max_len {
                    return None;
                }
                if !VENDOR_FALLBACK_LINE.is_match(text) || has_keyword(text, VENDOR_BOILERPLATE) {
                    return None;
                }

                let confidence = line.confidence * fb.line_confidence_factor
                    + leading_bonus(i, fb.window, fb.position_weight);
                Some(Candidate::new(collapse_whitespace(text), confidence, i))
            })
            .collect()
    }
}

impl Default for VendorExtractor {
    fn default() -> Self {
        Self::new(&ExtractionConfig::default())
    }
}

impl FieldExtractor for VendorExtractor {
    type Output = String;

    fn candidates(&self, lines: &[TextLine], _full_text: &str) -> Vec<Candidate<String>> {
        let candidates = self.rule_candidates(lines);
        if candidates.is_empty() {
            self.fallback_candidates(lines)
        } else {
            candidates
        }
    }

    fn select(&self, candidates: Vec<Candidate<String>>) -> Option<Scored<String>> {
        most_confident(candidates).map(Candidate::into_scored)
    }
}

fn is_stop_line(text: &str) -> bool {
    let lower = text.to_lowercase();
    VENDOR_STOP_LINES.contains(&lower.as_str())
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invoice::rules::tests::lines;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_company_suffix_line() {
        let doc = lines(&["Acme Corp Inc."], 0.9);
        let vendor = VendorExtractor::default().extract(&doc, "").unwrap();

        assert_eq!(vendor.value, "Acme Corp Inc.");
        assert!(vendor.confidence >= 0.9);
        assert!(vendor.confidence <= 1.0);
    }

    #[test]
    fn test_labeled_vendor() {
        let doc = lines(&["INVOICE", "Remit to: Globex   Trading LLC", "Page 1 of 1"], 0.6);
        let vendor = VendorExtractor::default().extract(&doc, "").unwrap();

        assert_eq!(vendor.value, "Globex Trading LLC");
        // 0.6 line + 0.3 rule + (19/20)*0.1 position
        assert!((vendor.confidence - 0.995).abs() < 1e-4);
    }

    #[test]
    fn test_position_bonus_prefers_earlier_line() {
        let doc = lines(&["Initech Ltd", "Umbrella Corp"], 0.5);
        let candidates = VendorExtractor::default().candidates(&doc, "");
        assert!(candidates.iter().all(|c| c.rule.is_some()));

        let vendor = VendorExtractor::default().extract(&doc, "").unwrap();
        assert_eq!(vendor.value, "Initech Ltd");
    }

    #[test]
    fn test_stop_lines_skipped() {
        let doc = lines(&["Invoice", "Total", "ab"], 0.9);
        assert!(VendorExtractor::default().candidates(&doc, "").is_empty());
    }

    #[test]
    fn test_fallback_plain_line() {
        let doc = lines(&["12 Main Street", "Bolts", "Phone 555 1234"], 0.8);
        let extractor = VendorExtractor::default();
        assert!(extractor.rule_candidates(&doc).is_empty());

        let vendor = extractor.extract(&doc, "").unwrap();
        assert_eq!(vendor.value, "Bolts");
        // 0.8 * 0.5 + (14/15) * 0.2
        assert!((vendor.confidence - (0.4 + 14.0 / 15.0 * 0.2)).abs() < 1e-4);
    }

    #[test]
    fn test_fallback_rejects_boilerplate_and_lowercase_start() {
        let doc = lines(&["Billing Address", "acme widgets", "Date Of Issue"], 0.9);
        assert!(VendorExtractor::default().fallback_candidates(&doc).is_empty());
    }

    #[test]
    fn test_window_limits_scan() {
        let mut texts = vec!["12345"; 25];
        texts.push("Acme Corp Inc.");
        let doc = lines(&texts, 0.9);
        assert!(VendorExtractor::default().extract(&doc, "").is_none());
    }

    #[test]
    fn test_empty_document() {
        assert!(VendorExtractor::default().extract(&[], "").is_none());
    }
}
