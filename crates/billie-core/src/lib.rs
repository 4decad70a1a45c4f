//! Core library for scanned invoice field extraction.
//!
//! This crate provides:
//! - PDF rasterization (poppler `pdftoppm`, or embedded page images via lopdf)
//! - Page preprocessing (adaptive binarization, denoise, deskew)
//! - OCR through Tesseract behind a pluggable engine trait
//! - Confidence-scored extraction of vendor, date, total, and invoice number

pub mod error;
pub mod invoice;
pub mod models;
pub mod ocr;
pub mod pdf;

pub use error::{BillieError, OcrError, PdfError, Result};
pub use invoice::{FieldExtractor, InvoiceExtractor, InvoiceExtractorBuilder};
pub use models::config::BillieConfig;
pub use models::result::{ExtractedFields, ExtractionResult, Scored};
pub use ocr::{CollectedText, ImagePreprocessor, OcrEngine, OcrToken, TesseractEngine, TextLine};
pub use pdf::{EmbeddedImageRasterizer, PageRasterizer, PopplerRasterizer};
