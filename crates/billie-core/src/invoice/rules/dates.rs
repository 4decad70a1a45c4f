//! Invoice date extraction.

use chrono::{Datelike, NaiveDate};

use crate::models::config::{ExtractionConfig, FieldScoring};
use crate::models::result::Scored;
use crate::ocr::TextLine;

use super::patterns::{DATE_KEYWORDS, DATE_RULES};
use super::{blend, first_max_by, has_keyword, head, leading_bonus, Candidate, FieldExtractor};

/// Accepted date layouts, tried in order. Month-first wins over day-first
/// for ambiguous numeric dates.
const DATE_FORMATS: &[&str] = &[
    "%m-%d-%Y",
    "%d-%m-%Y",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%Y-%m-%d",
    "%m.%d.%Y",
    "%d.%m.%Y",
    "%Y.%m.%d",
    "%Y/%m/%d",
    "%B %d, %Y",
    "%b %d, %Y",
    "%B %d %Y",
    "%b %d %Y",
    "%d %B %Y",
    "%d %b %Y",
    "%d %B, %Y",
    "%d %b, %Y",
    "%m-%d-%y",
    "%d-%m-%y",
    "%m/%d/%y",
    "%d/%m/%y",
];

/// Parse a captured date string against the accepted layouts.
///
/// Four-digit-year layouts reject short years so that `01/15/24` falls
/// through to the two-digit-year layouts.
pub fn normalize_date(raw: &str) -> Option<NaiveDate> {
    let cleaned = raw.split_whitespace().collect::<Vec<_>>().join(" ");

    DATE_FORMATS.iter().find_map(|format| {
        let date = NaiveDate::parse_from_str(&cleaned, format).ok()?;
        if format.contains("%Y") && date.year() < 1000 {
            return None;
        }
        Some(date)
    })
}

/// Invoice date extractor.
pub struct DateExtractor {
    scoring: FieldScoring,
}

impl DateExtractor {
    pub fn new(config: &ExtractionConfig) -> Self {
        Self {
            scoring: config.date,
        }
    }
}

impl Default for DateExtractor {
    fn default() -> Self {
        Self::new(&ExtractionConfig::default())
    }
}

impl FieldExtractor for DateExtractor {
    type Output = NaiveDate;

    fn candidates(&self, lines: &[TextLine], _full_text: &str) -> Vec<Candidate<NaiveDate>> {
        let mut candidates = Vec::new();

        for (i, line) in head(lines, self.scoring.window).iter().enumerate() {
            let has_label = has_keyword(&line.text, DATE_KEYWORDS);
            let label_bonus = if has_label { self.scoring.label_bonus } else { 0.0 };
            let position_bonus = leading_bonus(i, self.scoring.window, self.scoring.position_weight);

            for (rule_index, rule) in DATE_RULES.iter().enumerate() {
                let Some(date) = rule.capture(&line.text).and_then(normalize_date) else {
                    continue;
                };
                let confidence = blend(line.confidence, rule.base_weight, position_bonus, label_bonus);
                candidates.push(
                    Candidate::new(date, confidence, i)
                        .with_rule(rule_index)
                        .with_label(has_label),
                );
            }
        }

        candidates
    }

    fn select(&self, candidates: Vec<Candidate<NaiveDate>>) -> Option<Scored<NaiveDate>> {
        first_max_by(candidates, |a, b| {
            a.confidence
                .total_cmp(&b.confidence)
                .then(a.has_label.cmp(&b.has_label))
        })
        .map(Candidate::into_scored)
    }
}
