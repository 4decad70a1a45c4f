//! Drives preprocessing and OCR over a document's pages.

use image::DynamicImage;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::error::OcrError;
use crate::models::result::clamp_confidence;

use super::{ImagePreprocessor, OcrEngine, OcrToken, TextLine};

/// Text lines of one document plus the space-joined full text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollectedText {
    pub lines: Vec<TextLine>,
    pub full_text: String,
}

impl CollectedText {
    /// Build from lines already in reading order.
    pub fn from_lines(lines: Vec<TextLine>) -> Self {
        let full_text = lines
            .iter()
            .map(|l| l.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        Self { lines, full_text }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Collects OCR text lines page by page.
///
/// A page that fails preprocessing or recognition is logged and skipped.
pub struct TextLineCollector<'a> {
    engine: &'a dyn OcrEngine,
    preprocessor: &'a ImagePreprocessor,
    language: &'a str,
    parallel: bool,
}

impl<'a> TextLineCollector<'a> {
    pub fn new(engine: &'a dyn OcrEngine, preprocessor: &'a ImagePreprocessor, language: &'a str) -> Self {
        Self {
            engine,
            preprocessor,
            language,
            parallel: false,
        }
    }

    /// Process pages concurrently; output order is unchanged.
    pub fn with_parallel_pages(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn collect(&self, pages: &[DynamicImage]) -> CollectedText {
        let per_page: Vec<Result<Vec<OcrToken>, OcrError>> = if self.parallel {
            pages.par_iter().map(|page| self.recognize_page(page)).collect()
        } else {
            pages.iter().map(|page| self.recognize_page(page)).collect()
        };

        let mut lines = Vec::new();
        for (page, result) in per_page.into_iter().enumerate() {
            match result {
                Ok(tokens) => {
                    let before = lines.len();
                    lines.extend(
                        tokens
                            .into_iter()
                            .filter(|t| !t.text.trim().is_empty())
                            .map(|t| {
                                TextLine::new(t.text.trim(), clamp_confidence(t.confidence), page, t.top)
                            }),
                    );
                    debug!("Page {}: {} text lines", page, lines.len() - before);
                }
                Err(e) => {
                    warn!("Skipping page {}: {}", page, e);
                }
            }
        }

        info!(
            "Collected {} text lines from {} page(s) with {}",
            lines.len(),
            pages.len(),
            self.engine.name()
        );

        CollectedText::from_lines(lines)
    }

    fn recognize_page(&self, page: &DynamicImage) -> Result<Vec<OcrToken>, OcrError> {
        let preprocessed = self.preprocessor.preprocess(page)?;
        self.engine.recognize(&preprocessed, self.language)
    }
}
