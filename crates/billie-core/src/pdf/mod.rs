//! PDF rasterization module.

mod extractor;
mod poppler;

pub use extractor::EmbeddedImageRasterizer;
pub use poppler::PopplerRasterizer;

#[cfg(test)]
pub(crate) use extractor::tests::empty_document;

use std::path::Path;

use crate::error::PdfError;
use crate::models::config::{PdfConfig, RasterizerKind};
use image::DynamicImage;

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, PdfError>;

/// Turns a PDF into page images.
///
/// Pages come back in ascending page order. A document without pages
/// yields an empty list. Any failure is fatal for the document.
pub trait PageRasterizer: Send + Sync {
    /// Render every page of the PDF at `dpi`.
    fn rasterize(&self, pdf_path: &Path, dpi: u32) -> Result<Vec<DynamicImage>>;
}

/// Build the rasterizer selected by configuration.
pub fn rasterizer_from_config(config: &PdfConfig) -> Box<dyn PageRasterizer> {
    match config.rasterizer {
        RasterizerKind::Poppler => Box::new(PopplerRasterizer::new(&config.pdftoppm_path)),
        RasterizerKind::Embedded => Box::new(EmbeddedImageRasterizer::new()),
    }
}
