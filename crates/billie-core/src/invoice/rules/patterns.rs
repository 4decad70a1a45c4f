//! Pattern tables for invoice field extraction.
//!
//! Pure data: every rule is a case-insensitive regex whose first capture
//! group is the field value, paired with the weight it adds to a match.

use lazy_static::lazy_static;
use regex::Regex;

/// A field pattern and the confidence weight a match contributes.
#[derive(Debug, Clone)]
pub struct PatternRule {
    pub pattern: Regex,
    pub base_weight: f32,
}

impl PatternRule {
    /// Compile a rule; matching is case-insensitive.
    pub fn new(pattern: &str, base_weight: f32) -> Self {
        Self {
            pattern: Regex::new(&format!("(?i){}", pattern)).unwrap(),
            base_weight,
        }
    }

    /// Trimmed first capture group of the first match in `text`.
    pub fn capture<'t>(&self, text: &'t str) -> Option<&'t str> {
        self.pattern
            .captures(text)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim())
    }

    /// Trimmed first capture group of every match in `text`.
    pub fn captures<'r, 't>(&'r self, text: &'t str) -> impl Iterator<Item = &'t str> + 'r
    where
        't: 'r,
    {
        self.pattern
            .captures_iter(text)
            .filter_map(|caps| caps.get(1))
            .map(|m| m.as_str().trim())
    }
}

const COMPANY_SUFFIX: &str = r"(?:Inc|LLC|Corp|Co|Ltd|GmbH|S\.A\.|Pty|Ltd\.|Corp\.|Inc\.)";
const VENDOR_LABEL: &str =
    r"\b(?:from|vendor|supplier|bill\s+from|invoice\s+from|payable\s+to|remit\s+to|sold\s+by)";
const DATE_LABEL: &str = r"(?:invoice\s+date|date|due\s+date)";
const MONEY: &str = r"([\d,]+\.?\d*)";
const ID: &str = r"([A-Z0-9][A-Z0-9-]*)";

lazy_static! {
    pub static ref VENDOR_RULES: Vec<PatternRule> = vec![
        PatternRule::new(&format!(r"{VENDOR_LABEL}[:\s]+([A-Z][A-Za-z\s&]+{COMPANY_SUFFIX})"), 0.3),
        PatternRule::new(&format!(r"^([A-Z][A-Za-z\s&]+{COMPANY_SUFFIX})\s*$"), 0.2),
        PatternRule::new(&format!(r"{VENDOR_LABEL}[:\s]+([A-Z][a-zA-Z\s&]{{2,}}(?:\s+[A-Z][a-z]+)*)"), 0.25),
        PatternRule::new(r"^([A-Z][A-Za-z\s&]{5,50})\s*$", 0.15),
    ];

    /// Plain capitalized line for the vendor fallback pass (case-sensitive).
    pub static ref VENDOR_FALLBACK_LINE: Regex = Regex::new(r"^[A-Z][A-Za-z\s&]+$").unwrap();

    pub static ref DATE_RULES: Vec<PatternRule> = vec![
        PatternRule::new(&format!(r"{DATE_LABEL}[:\s]*(\d{{1,2}}[-/.]\d{{1,2}}[-/.]\d{{2,4}})\b"), 0.3),
        PatternRule::new(&format!(r"{DATE_LABEL}[:\s]*(\d{{4}}[-/.]\d{{1,2}}[-/.]\d{{1,2}})\b"), 0.3),
        PatternRule::new(&format!(r"{DATE_LABEL}[:\s]*([A-Za-z]{{3,9}}\s+\d{{1,2}}[,\s]+\d{{4}})"), 0.35),
        PatternRule::new(&format!(r"{DATE_LABEL}[:\s]*(\d{{1,2}}\s+[A-Za-z]{{3,9}}[,\s]+\d{{4}})"), 0.35),
        PatternRule::new(r"\b(\d{1,2}[-/.]\d{1,2}[-/.]\d{2,4})\b", 0.1),
        PatternRule::new(r"\b(\d{4}[-/.]\d{1,2}[-/.]\d{1,2})\b", 0.1),
        PatternRule::new(r"\b([A-Za-z]{3,9}\s+\d{1,2}[,\s]+\d{4})", 0.15),
        PatternRule::new(r"\b(\d{1,2}\s+[A-Za-z]{3,9}[,\s]+\d{4})", 0.15),
    ];

    pub static ref TOTAL_RULES: Vec<PatternRule> = vec![
        PatternRule::new(
            &format!(r"(?:total\s+amount|total|grand\s+total|amount\s+due|balance\s+due|amount\s+payable|net\s+amount)[:\s]*[$€£¥]?\s*{MONEY}"),
            0.35,
        ),
        PatternRule::new(&format!(r"total\s*[$€£¥]\s*{MONEY}"), 0.3),
        PatternRule::new(&format!(r"(?:balance\s+due|amount\s+payable)[:\s]*[$€£¥]?\s*{MONEY}"), 0.3),
        PatternRule::new(&format!(r"[$€£¥]\s*{MONEY}\s*(?:total|due|payable)?"), 0.2),
        PatternRule::new(&format!(r"total[:\s]*{MONEY}"), 0.25),
    ];

    pub static ref INVOICE_NUMBER_RULES: Vec<PatternRule> = vec![
        PatternRule::new(
            &format!(r"\b(?:invoice\s+(?:number|num|no\.?)|invoice\s*#|inv\s*(?:#|no\.?)|invoice)[:\s]*{ID}"),
            0.35,
        ),
        PatternRule::new(&format!(r"\b(?:bill\s+(?:number|no\.?)|bill\s*#|bill)[:\s]*{ID}"), 0.3),
        PatternRule::new(
            &format!(r"\b(?:ref(?:erence)?\s+(?:number|no\.?)|ref(?:erence)?\s*#|reference|ref\.?)[:\s]*{ID}"),
            0.25,
        ),
        PatternRule::new(&format!(r"\b(?:INV-?|INVOICE)\s*[:#]?\s*{ID}"), 0.3),
        PatternRule::new(&format!(r"\bBILL-?\s*[:#]?\s*{ID}"), 0.25),
        PatternRule::new(r"\b([A-Z]{2,4}[-_]?\d{4,})\b", 0.15),
    ];
}

/// Exact line texts that are never a vendor name.
pub const VENDOR_STOP_LINES: &[&str] = &["invoice", "bill", "date", "total", "amount", "page"];

/// Words that disqualify a line in the vendor fallback pass.
pub const VENDOR_BOILERPLATE: &[&str] = &[
    "invoice", "bill", "date", "total", "amount", "page", "address", "phone", "email",
];

pub const DATE_KEYWORDS: &[&str] = &["date"];
pub const TOTAL_KEYWORDS: &[&str] = &["total"];
pub const INVOICE_NUMBER_KEYWORDS: &[&str] = &["invoice", "bill", "ref"];
