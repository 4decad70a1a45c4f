//! Page preprocessing, OCR engine seam, and text-line collection.

mod collector;
mod preprocessing;
mod tesseract;

pub use collector::{CollectedText, TextLineCollector};
pub use preprocessing::{estimate_skew, ImagePreprocessor, SkewEstimate};
pub use tesseract::TesseractEngine;

#[cfg(test)]
pub(crate) use collector::tests::{page as blank_page, ScriptedEngine};

use image::GrayImage;
use serde::{Deserialize, Serialize};

use crate::error::OcrError;

/// One recognized token as reported by an OCR engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrToken {
    /// Recognized text.
    pub text: String,

    /// Recognition confidence (0.0 - 1.0).
    pub confidence: f32,

    /// Distance of the token's top edge from the top of the page, in pixels.
    pub top: i32,
}

impl OcrToken {
    pub fn new(text: impl Into<String>, confidence: f32, top: i32) -> Self {
        Self {
            text: text.into(),
            confidence,
            top,
        }
    }
}

/// A text line in document reading order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextLine {
    pub text: String,

    /// OCR confidence (0.0 - 1.0).
    pub confidence: f32,

    /// Zero-based page index.
    pub page: usize,

    pub vertical_position: i32,
}

impl TextLine {
    pub fn new(text: impl Into<String>, confidence: f32, page: usize, vertical_position: i32) -> Self {
        Self {
            text: text.into(),
            confidence,
            page,
            vertical_position,
        }
    }
}

/// Text recognizer for preprocessed page images.
///
/// Implementations are shared across extraction calls; one that cannot be
/// invoked concurrently must serialize internally.
pub trait OcrEngine: Send + Sync {
    /// Short engine name for logs.
    fn name(&self) -> &str;

    /// Recognize the tokens of one page image, in reading order.
    fn recognize(&self, image: &GrayImage, language: &str) -> Result<Vec<OcrToken>, OcrError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn test_estimate_skew_of_axis_aligned_block() {
        let mut page = GrayImage::from_pixel(40, 40, Luma([255]));
        for y in 10..30 {
            for x in 5..35 {
                page.put_pixel(x, y, Luma([0]));
            }
        }

        let skew: SkewEstimate = estimate_skew(&page).unwrap();
        assert!(skew.angle_degrees.abs() < 1.0);
        assert_eq!(skew.foreground_pixels, 600);
    }
}
