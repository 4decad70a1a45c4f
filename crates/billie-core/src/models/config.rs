//! Configuration structures for the extraction pipeline.

use serde::{Deserialize, Deserializer, Serialize};
use std::path::PathBuf;

/// Main configuration for the billie pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BillieConfig {
    /// OCR configuration.
    pub ocr: OcrConfig,

    /// PDF rasterization configuration.
    pub pdf: PdfConfig,

    /// Page image preprocessing configuration.
    pub preprocessing: PreprocessConfig,

    /// Field extraction configuration.
    pub extraction: ExtractionConfig,
}

/// How the OCR engine groups recognized words into tokens.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenGranularity {
    /// One token per recognized word.
    Word,
    /// One token per recognized text line.
    #[default]
    Line,
}

/// OCR engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Language code passed to the OCR engine.
    pub language: String,

    /// Path or name of the tesseract executable.
    pub tesseract_path: PathBuf,

    /// Token granularity reported by the engine.
    pub granularity: TokenGranularity,

    /// Preprocess and recognize pages in parallel.
    ///
    /// Requires an engine binding that tolerates concurrent calls.
    pub parallel_pages: bool,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            language: "eng".to_string(),
            tesseract_path: PathBuf::from("tesseract"),
            granularity: TokenGranularity::Line,
            parallel_pages: false,
        }
    }
}

/// Which rasterizer turns PDF pages into images.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RasterizerKind {
    /// Render pages with poppler's `pdftoppm`.
    #[default]
    Poppler,
    /// Pull the scanned image embedded in each page.
    Embedded,
}

/// PDF rasterization configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    /// DPI for rendering PDF pages to images.
    pub render_dpi: u32,

    /// Rasterizer implementation.
    pub rasterizer: RasterizerKind,

    /// Path or name of the pdftoppm executable.
    pub pdftoppm_path: PathBuf,

    /// Maximum pages to process (0 = unlimited).
    pub max_pages: usize,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            render_dpi: 300,
            rasterizer: RasterizerKind::Poppler,
            pdftoppm_path: PathBuf::from("pdftoppm"),
            max_pages: 0,
        }
    }
}

/// Image preprocessing configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessConfig {
    /// Neighbourhood size for adaptive thresholding (odd).
    pub threshold_block_size: u32,

    /// Constant subtracted from the weighted local mean.
    pub threshold_offset: f32,

    /// Median filter radius (1 = 3x3 window).
    pub median_radius: u32,

    /// Estimate and correct page skew.
    pub deskew: bool,

    /// Skew angles at or below this magnitude are left alone.
    pub min_skew_degrees: f32,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            threshold_block_size: 11,
            threshold_offset: 2.0,
            median_radius: 1,
            deskew: true,
            min_skew_degrees: 0.5,
        }
    }
}

/// Scoring parameters shared by every field scanner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldScoring {
    /// Number of lines scanned (0 = the whole document).
    pub window: usize,

    /// Maximum positional bonus.
    pub position_weight: f32,

    /// Bonus when the line carries an explicit field keyword.
    pub label_bonus: f32,
}

impl FieldScoring {
    pub const fn new(window: usize, position_weight: f32, label_bonus: f32) -> Self {
        Self {
            window,
            position_weight,
            label_bonus,
        }
    }
}

const VENDOR_SCORING: FieldScoring = FieldScoring::new(20, 0.1, 0.0);
const DATE_SCORING: FieldScoring = FieldScoring::new(0, 0.0, 0.2);
const TOTAL_SCORING: FieldScoring = FieldScoring::new(30, 0.1, 0.15);
const INVOICE_NUMBER_SCORING: FieldScoring = FieldScoring::new(40, 0.05, 0.1);

/// A scoring block as written in a config file. Missing keys keep the
/// defaults of the field the block belongs to.
#[derive(Deserialize)]
struct ScoringOverride {
    window: Option<usize>,
    position_weight: Option<f32>,
    label_bonus: Option<f32>,
}

fn scoring_over<'de, D>(deserializer: D, base: FieldScoring) -> Result<FieldScoring, D::Error>
where
    D: Deserializer<'de>,
{
    let overrides = ScoringOverride::deserialize(deserializer)?;
    Ok(FieldScoring {
        window: overrides.window.unwrap_or(base.window),
        position_weight: overrides.position_weight.unwrap_or(base.position_weight),
        label_bonus: overrides.label_bonus.unwrap_or(base.label_bonus),
    })
}

fn vendor_scoring<'de, D: Deserializer<'de>>(d: D) -> Result<FieldScoring, D::Error> {
    scoring_over(d, VENDOR_SCORING)
}

fn date_scoring<'de, D: Deserializer<'de>>(d: D) -> Result<FieldScoring, D::Error> {
    scoring_over(d, DATE_SCORING)
}

fn total_scoring<'de, D: Deserializer<'de>>(d: D) -> Result<FieldScoring, D::Error> {
    scoring_over(d, TOTAL_SCORING)
}

fn invoice_number_scoring<'de, D: Deserializer<'de>>(d: D) -> Result<FieldScoring, D::Error> {
    scoring_over(d, INVOICE_NUMBER_SCORING)
}

/// Vendor fallback pass parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VendorFallback {
    /// Number of leading lines scanned.
    pub window: usize,

    /// Factor applied to the line's OCR confidence.
    pub line_confidence_factor: f32,

    /// Maximum positional bonus.
    pub position_weight: f32,

    /// Minimum line length in characters.
    pub min_len: usize,

    /// Maximum line length in characters.
    pub max_len: usize,
}

impl Default for VendorFallback {
    fn default() -> Self {
        Self {
            window: 15,
            line_confidence_factor: 0.5,
            position_weight: 0.2,
            min_len: 5,
            max_len: 60,
        }
    }
}

/// Field extraction configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Vendor scan: first lines, earlier is better.
    #[serde(deserialize_with = "vendor_scoring")]
    pub vendor: FieldScoring,

    /// Secondary vendor pass over plain capitalized lines.
    pub vendor_fallback: VendorFallback,

    /// Date scan: whole document, no positional bonus.
    #[serde(deserialize_with = "date_scoring")]
    pub date: FieldScoring,

    /// Total scan: last lines, scanned in reverse.
    #[serde(deserialize_with = "total_scoring")]
    pub total: FieldScoring,

    /// Invoice number scan: first lines, earlier is better.
    #[serde(deserialize_with = "invoice_number_scoring")]
    pub invoice_number: FieldScoring,

    /// Totals at or below this confidence lose the largest-value rule.
    pub total_min_confidence: f32,

    /// Purely numeric invoice numbers need at least this many digits.
    pub invoice_number_min_digits: usize,

    /// Fields below this confidence are flagged for human review.
    pub review_threshold: f32,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            vendor: VENDOR_SCORING,
            vendor_fallback: VendorFallback::default(),
            date: DATE_SCORING,
            total: TOTAL_SCORING,
            invoice_number: INVOICE_NUMBER_SCORING,
            total_min_confidence: 0.3,
            invoice_number_min_digits: 4,
            review_threshold: 0.8,
        }
    }
}

impl BillieConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: BillieConfig =
            serde_json::from_str(r#"{"ocr": {"language": "deu"}, "pdf": {"rasterizer": "embedded"}}"#)
                .unwrap();

        assert_eq!(config.ocr.language, "deu");
        assert_eq!(config.ocr.granularity, TokenGranularity::Line);
        assert_eq!(config.pdf.rasterizer, RasterizerKind::Embedded);
        assert_eq!(config.pdf.render_dpi, 300);
        assert_eq!(config.extraction, ExtractionConfig::default());
    }

    #[test]
    fn test_partial_field_scoring_keeps_field_defaults() {
        let config: BillieConfig = serde_json::from_str(
            r#"{"extraction": {"vendor": {"window": 10}, "total": {"label_bonus": 0.2}}}"#,
        )
        .unwrap();

        assert_eq!(config.extraction.vendor, FieldScoring::new(10, 0.1, 0.0));
        assert_eq!(config.extraction.total, FieldScoring::new(30, 0.1, 0.2));
        assert_eq!(config.extraction.date, ExtractionConfig::default().date);
        assert_eq!(config.extraction.review_threshold, 0.8);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = BillieConfig::default();
        config.extraction.total_min_confidence = 0.4;
        config.save(&path).unwrap();

        assert_eq!(BillieConfig::from_file(&path).unwrap(), config);
    }
}
