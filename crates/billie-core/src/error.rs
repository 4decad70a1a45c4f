//! Error types for the billie-core library.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for the billie library.
#[derive(Error, Debug)]
pub enum BillieError {
    /// Input document does not exist.
    #[error("input file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// PDF rasterization error.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// OCR engine error.
    #[error("OCR error: {0}")]
    Ocr(#[from] OcrError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors related to turning a PDF into page images.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// The rasterizer tool failed.
    #[error("failed to rasterize PDF: {0}")]
    Rasterize(String),

    /// Failed to pull a page image out of the PDF.
    #[error("failed to extract images: {0}")]
    ImageExtraction(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// Invalid page number requested.
    #[error("invalid page number: {0}")]
    InvalidPage(u32),
}

/// Errors related to preprocessing and OCR.
#[derive(Error, Debug)]
pub enum OcrError {
    /// The OCR engine is missing or cannot be started.
    #[error("OCR engine unavailable: {0}")]
    EngineUnavailable(String),

    /// Text recognition failed for one image.
    #[error("text recognition failed: {0}")]
    Recognition(String),

    /// The engine produced output we could not read.
    #[error("unreadable engine output: {0}")]
    Output(String),

    /// Invalid image format or dimensions.
    #[error("invalid image: {0}")]
    InvalidImage(String),
}

/// Result type for the billie library.
pub type Result<T> = std::result::Result<T, BillieError>;
