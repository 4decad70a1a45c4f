//! End-to-end extraction pipeline: PDF to scored invoice fields.

use std::fmt::Display;
use std::io::Write;
use std::path::Path;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::error::{BillieError, Result};
use crate::models::config::BillieConfig;
use crate::models::result::{ExtractedFields, ExtractionResult, Scored};
use crate::ocr::{CollectedText, ImagePreprocessor, OcrEngine, TesseractEngine, TextLine, TextLineCollector};
use crate::pdf::{rasterizer_from_config, PageRasterizer};

use super::rules::{
    DateExtractor, FieldExtractor, InvoiceNumberExtractor, TotalExtractor, VendorExtractor,
};

/// Extracts vendor, date, total, and invoice number from scanned invoices.
///
/// Holds no per-document state, so one instance can serve concurrent
/// calls. Concurrency is bounded by the OCR engine: the engine must
/// tolerate being invoked from several threads at once.
pub struct InvoiceExtractor {
    config: BillieConfig,
    rasterizer: Box<dyn PageRasterizer>,
    engine: Box<dyn OcrEngine>,
    preprocessor: ImagePreprocessor,
    vendor: VendorExtractor,
    date: DateExtractor,
    total: TotalExtractor,
    invoice_number: InvoiceNumberExtractor,
}

impl InvoiceExtractor {
    /// Build the default pipeline: configured rasterizer plus Tesseract.
    ///
    /// Fails with [`crate::OcrError::EngineUnavailable`] when the Tesseract
    /// executable cannot be run.
    pub fn from_config(config: BillieConfig) -> Result<Self> {
        let engine = TesseractEngine::from_config(&config.ocr)?;
        Ok(Self::builder(engine).config(config).build())
    }

    /// Start building an extractor around an OCR engine.
    pub fn builder(engine: impl OcrEngine + 'static) -> InvoiceExtractorBuilder {
        InvoiceExtractorBuilder {
            config: BillieConfig::default(),
            rasterizer: None,
            engine: Box::new(engine),
        }
    }

    pub fn config(&self) -> &BillieConfig {
        &self.config
    }

    /// Extract invoice fields from a PDF on disk.
    ///
    /// A missing file or a rasterization failure fails the whole document.
    /// Pages whose OCR fails are skipped.
    pub fn extract(&self, pdf_path: &Path) -> Result<ExtractionResult> {
        let start = Instant::now();
        let text = self.collect_text(pdf_path)?;

        if text.is_empty() {
            warn!("No text recognized in {}", pdf_path.display());
            return Ok(ExtractionResult::empty());
        }

        let result = ExtractionResult::from(self.extract_fields(&text.lines, &text.full_text));

        info!(
            "Extracted {} in {}ms",
            pdf_path.display(),
            start.elapsed().as_millis()
        );

        Ok(result)
    }

    /// Extract invoice fields from PDF bytes.
    pub fn extract_bytes(&self, pdf: &[u8]) -> Result<ExtractionResult> {
        let mut file = tempfile::Builder::new()
            .prefix("billie_upload_")
            .suffix(".pdf")
            .tempfile()?;
        file.write_all(pdf)?;
        file.flush()?;

        debug!("Spooled {} bytes to {}", pdf.len(), file.path().display());

        self.extract(file.path())
    }

    /// Rasterize, preprocess, and OCR a PDF into ordered text lines.
    pub fn collect_text(&self, pdf_path: &Path) -> Result<CollectedText> {
        if !pdf_path.exists() {
            return Err(BillieError::NotFound(pdf_path.to_path_buf()));
        }

        let mut pages = self.rasterizer.rasterize(pdf_path, self.config.pdf.render_dpi)?;
        info!("Rasterized {} page(s) from {}", pages.len(), pdf_path.display());

        let max_pages = self.config.pdf.max_pages;
        if max_pages > 0 && pages.len() > max_pages {
            debug!("Keeping first {} of {} pages", max_pages, pages.len());
            pages.truncate(max_pages);
        }

        let collector = TextLineCollector::new(
            self.engine.as_ref(),
            &self.preprocessor,
            &self.config.ocr.language,
        )
        .with_parallel_pages(self.config.ocr.parallel_pages);

        Ok(collector.collect(&pages))
    }

    /// Run field extraction on lines that were already collected.
    pub fn extract_lines(&self, lines: &[TextLine]) -> ExtractionResult {
        let text = CollectedText::from_lines(lines.to_vec());
        self.extract_fields(&text.lines, &text.full_text).into()
    }

    /// Run the four field extractors, keeping "not found" explicit.
    pub fn extract_fields(&self, lines: &[TextLine], full_text: &str) -> ExtractedFields {
        let fields = ExtractedFields {
            vendor: self.vendor.extract(lines, full_text),
            date: self.date.extract(lines, full_text),
            total: self.total.extract(lines, full_text),
            invoice_number: self.invoice_number.extract(lines, full_text),
        };

        log_outcome("vendor", &fields.vendor);
        log_outcome("date", &fields.date);
        log_outcome("total", &fields.total);
        log_outcome("invoice_number", &fields.invoice_number);

        fields
    }
}

fn log_outcome<T: Display>(field: &str, outcome: &Option<Scored<T>>) {
    match outcome {
        Some(scored) => info!("{}: {} (confidence {:.2})", field, scored.value, scored.confidence),
        None => warn!("{}: no match, using default", field),
    }
}

/// Builder for [`InvoiceExtractor`].
pub struct InvoiceExtractorBuilder {
    config: BillieConfig,
    rasterizer: Option<Box<dyn PageRasterizer>>,
    engine: Box<dyn OcrEngine>,
}

impl InvoiceExtractorBuilder {
    pub fn config(mut self, config: BillieConfig) -> Self {
        self.config = config;
        self
    }

    /// Override the rasterizer selected by `config.pdf.rasterizer`.
    pub fn rasterizer(mut self, rasterizer: impl PageRasterizer + 'static) -> Self {
        self.rasterizer = Some(Box::new(rasterizer));
        self
    }

    pub fn build(self) -> InvoiceExtractor {
        let config = self.config;
        let rasterizer = self
            .rasterizer
            .unwrap_or_else(|| rasterizer_from_config(&config.pdf));

        InvoiceExtractor {
            rasterizer,
            engine: self.engine,
            preprocessor: ImagePreprocessor::with_config(config.preprocessing.clone()),
            vendor: VendorExtractor::new(&config.extraction),
            date: DateExtractor::new(&config.extraction),
            total: TotalExtractor::new(&config.extraction),
            invoice_number: InvoiceNumberExtractor::new(&config.extraction),
            config,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{OcrError, PdfError};
    use crate::ocr::{blank_page, OcrToken, ScriptedEngine};
    use crate::pdf::{empty_document, EmbeddedImageRasterizer};
    use image::DynamicImage;
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;
    use std::str::FromStr;
    use tempfile::NamedTempFile;

    /// Rasterizer producing `pages` blank pages for any file that looks
    /// like a PDF.
    struct FakeRasterizer {
        pages: usize,
    }

    impl PageRasterizer for FakeRasterizer {
        fn rasterize(&self, pdf_path: &Path, dpi: u32) -> crate::pdf::Result<Vec<DynamicImage>> {
            assert_eq!(dpi, 300);
            let bytes = std::fs::read(pdf_path).map_err(|e| PdfError::Parse(e.to_string()))?;
            if !bytes.starts_with(b"%PDF") {
                return Err(PdfError::Rasterize("not a PDF".to_string()));
            }
            Ok((0..self.pages).map(blank_page).collect())
        }
    }

    fn pdf_file() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"%PDF-1.4\n%%EOF\n").unwrap();
        file
    }

    fn tokens(texts: &[&str]) -> Option<Vec<OcrToken>> {
        Some(
            texts
                .iter()
                .enumerate()
                .map(|(i, t)| OcrToken::new(*t, 0.9, i as i32 * 50))
                .collect(),
        )
    }

    fn extractor(pages: Vec<Option<Vec<OcrToken>>>, config: BillieConfig) -> InvoiceExtractor {
        let count = pages.len();
        InvoiceExtractor::builder(ScriptedEngine { pages })
            .rasterizer(FakeRasterizer { pages: count })
            .config(config)
            .build()
    }

    fn sample_invoice() -> Vec<Option<Vec<OcrToken>>> {
        vec![
            tokens(&[
                "Acme Corp Inc.",
                "Invoice Number: INV-2024-001",
                "Invoice Date: January 5, 2024",
            ]),
            None,
            tokens(&["Subtotal: $1,200.00", "Total: $1,250.50"]),
        ]
    }

    fn assert_confidences_in_range(result: &ExtractionResult) {
        for c in [
            result.vendor_confidence,
            result.date_confidence,
            result.total_confidence,
            result.invoice_number_confidence,
        ] {
            assert!((0.0..=1.0).contains(&c), "confidence {} out of range", c);
        }
    }

    #[test]
    fn test_extract_full_document() {
        let file = pdf_file();
        let result = extractor(sample_invoice(), BillieConfig::default())
            .extract(file.path())
            .unwrap();

        assert_eq!(result.vendor, "Acme Corp Inc.");
        assert!(result.vendor_confidence >= 0.9);
        assert_eq!(result.date.as_deref(), Some("2024-01-05"));
        assert_eq!(result.total, Decimal::from_str("1250.50").unwrap());
        assert_eq!(result.invoice_number.as_deref(), Some("INV-2024-001"));
        assert_confidences_in_range(&result);
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let err = extractor(sample_invoice(), BillieConfig::default())
            .extract(Path::new("/nonexistent/invoice.pdf"))
            .unwrap_err();

        assert!(matches!(err, BillieError::NotFound(_)));
    }

    #[test]
    fn test_rasterize_failure_is_fatal() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"plain text").unwrap();

        let err = extractor(sample_invoice(), BillieConfig::default())
            .extract(file.path())
            .unwrap_err();

        assert!(matches!(err, BillieError::Pdf(PdfError::Rasterize(_))));
    }

    #[test]
    fn test_no_text_gives_empty_record() {
        let file = pdf_file();
        let result = extractor(vec![Some(vec![]), None], BillieConfig::default())
            .extract(file.path())
            .unwrap();

        assert_eq!(result, ExtractionResult::empty());
    }

    #[test]
    fn test_zero_page_pdf_gives_empty_record() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&empty_document()).unwrap();

        let result = InvoiceExtractor::builder(ScriptedEngine { pages: vec![] })
            .rasterizer(EmbeddedImageRasterizer::new())
            .build()
            .extract(file.path())
            .unwrap();

        assert_eq!(result, ExtractionResult::empty());
    }

    #[test]
    fn test_max_pages_truncates() {
        let mut config = BillieConfig::default();
        config.pdf.max_pages = 1;
        let pages = vec![tokens(&["Acme Corp Inc."]), tokens(&["Total: $99.00"])];

        let file = pdf_file();
        let result = extractor(pages, config).extract(file.path()).unwrap();

        assert_eq!(result.vendor, "Acme Corp Inc.");
        assert_eq!(result.total, Decimal::from_str("0.01").unwrap());
        assert_eq!(result.total_confidence, 0.0);
    }

    #[test]
    fn test_parallel_pages_same_result() {
        let file = pdf_file();
        let sequential = extractor(sample_invoice(), BillieConfig::default())
            .extract(file.path())
            .unwrap();

        let mut config = BillieConfig::default();
        config.ocr.parallel_pages = true;
        let parallel = extractor(sample_invoice(), config).extract(file.path()).unwrap();

        assert_eq!(sequential, parallel);
    }

    #[test]
    fn test_extract_bytes() {
        let result = extractor(sample_invoice(), BillieConfig::default())
            .extract_bytes(b"%PDF-1.7\n")
            .unwrap();
        assert_eq!(result.invoice_number.as_deref(), Some("INV-2024-001"));

        let err = extractor(sample_invoice(), BillieConfig::default())
            .extract_bytes(b"GIF89a")
            .unwrap_err();
        assert!(matches!(err, BillieError::Pdf(_)));
    }

    #[test]
    fn test_extract_lines_is_deterministic() {
        let lines = vec![
            TextLine::new("Globex Trading LLC", 0.71, 0, 10),
            TextLine::new("Date: 03/04/2024", 0.83, 0, 60),
            TextLine::new("Ref # GX-20931", 0.64, 0, 110),
            TextLine::new("Amount Due: €312.40", 0.77, 0, 900),
        ];
        let extractor = extractor(vec![], BillieConfig::default());

        let first = serde_json::to_string(&extractor.extract_lines(&lines)).unwrap();
        for _ in 0..5 {
            assert_eq!(serde_json::to_string(&extractor.extract_lines(&lines)).unwrap(), first);
        }

        let result = extractor.extract_lines(&lines);
        assert_eq!(result.vendor, "Globex Trading LLC");
        assert_eq!(result.date.as_deref(), Some("2024-03-04"));
        assert_eq!(result.invoice_number.as_deref(), Some("GX-20931"));
        assert_eq!(result.total, Decimal::from_str("312.40").unwrap());
        assert_confidences_in_range(&result);
    }

    #[test]
    fn test_extract_fields_keeps_absence_explicit() {
        let extractor = extractor(vec![], BillieConfig::default());
        let lines = vec![TextLine::new("-- 1234 5678 --", 0.5, 0, 0)];

        let fields = extractor.extract_fields(&lines, "-- 1234 5678 --");
        assert_eq!(fields, ExtractedFields::default());
        assert_eq!(ExtractionResult::from(fields), ExtractionResult::empty());
    }

    #[test]
    fn test_from_config_without_tesseract() {
        let mut config = BillieConfig::default();
        config.ocr.tesseract_path = "/nonexistent/tesseract".into();

        let err = InvoiceExtractor::from_config(config).err().unwrap();
        assert!(matches!(err, BillieError::Ocr(OcrError::EngineUnavailable(_))));
    }
}
