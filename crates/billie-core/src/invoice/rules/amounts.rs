//! Invoice total extraction.

use std::str::FromStr;

use rust_decimal::Decimal;

use crate::models::config::{ExtractionConfig, FieldScoring};
use crate::models::result::Scored;
use crate::ocr::TextLine;

use super::patterns::{TOTAL_KEYWORDS, TOTAL_RULES};
use super::{blend, first_max_by, has_keyword, most_confident, tail, Candidate, FieldExtractor};

/// Parse a captured amount such as `1,250.50`.
///
/// Thousands separators are dropped. Returns `None` for anything that is
/// not a positive number.
pub fn parse_amount(raw: &str) -> Option<Decimal> {
    let cleaned: String = raw.chars().filter(|c| *c != ',').collect();
    let cleaned = cleaned.trim().trim_end_matches('.');
    if cleaned.is_empty() {
        return None;
    }

    Decimal::from_str(cleaned).ok().filter(|amount| *amount > Decimal::ZERO)
}

/// Invoice total extractor.
///
/// Scans the bottom of the document. Among candidates above the confidence
/// floor the largest amount wins; otherwise the most confident one does.
pub struct TotalExtractor {
    scoring: FieldScoring,
    min_confidence: f32,
}

impl TotalExtractor {
    pub fn new(config: &ExtractionConfig) -> Self {
        Self {
            scoring: config.total,
            min_confidence: config.total_min_confidence,
        }
    }
}

impl Default for TotalExtractor {
    fn default() -> Self {
        Self::new(&ExtractionConfig::default())
    }
}

impl FieldExtractor for TotalExtractor {
    type Output = Decimal;

    fn candidates(&self, lines: &[TextLine], _full_text: &str) -> Vec<Candidate<Decimal>> {
        let window = tail(lines, self.scoring.window);
        let mut candidates = Vec::new();

        // Walk the window bottom-up; lines nearer the top of the window
        // (further from the end) earn a larger position bonus.
        for (i, line) in window.iter().rev().enumerate() {
            let line_index = lines.len() - 1 - i;
            let has_label = has_keyword(&line.text, TOTAL_KEYWORDS);
            let label_bonus = if has_label { self.scoring.label_bonus } else { 0.0 };
            let position_bonus = if self.scoring.window == 0 {
                0.0
            } else {
                i as f32 / self.scoring.window as f32 * self.scoring.position_weight
            };

            for (rule_index, rule) in TOTAL_RULES.iter().enumerate() {
                let Some(amount) = rule.capture(&line.text).and_then(parse_amount) else {
                    continue;
                };
                let confidence = blend(line.confidence, rule.base_weight, position_bonus, label_bonus);
                candidates.push(
                    Candidate::new(amount, confidence, line_index)
                        .with_rule(rule_index)
                        .with_label(has_label),
                );
            }
        }

        candidates
    }

    fn select(&self, candidates: Vec<Candidate<Decimal>>) -> Option<Scored<Decimal>> {
        let (confident, rest): (Vec<_>, Vec<_>) = candidates
            .into_iter()
            .partition(|c| c.confidence > self.min_confidence);

        if confident.is_empty() {
            most_confident(rest)
        } else {
            first_max_by(confident, |a, b| a.value.cmp(&b.value))
        }
        .map(Candidate::into_scored)
    }
}
