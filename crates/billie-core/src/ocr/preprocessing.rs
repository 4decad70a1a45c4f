//! Image preprocessing for OCR.

use image::{DynamicImage, GenericImageView, GrayImage, Luma};
use imageproc::filter::{gaussian_blur_f32, median_filter};
use imageproc::geometric_transformations::{rotate_about_center, Interpolation};
use imageproc::geometry::min_area_rect;
use imageproc::point::Point;
use tracing::debug;

use crate::error::OcrError;
use crate::models::config::PreprocessConfig;

const FOREGROUND: u8 = 0;
const BACKGROUND: u8 = 255;

/// Skew of the foreground content of a binarized page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkewEstimate {
    /// Tilt of the content in degrees, in `(-45, 45]`. Positive means
    /// the content runs downhill to the right.
    pub angle_degrees: f32,
    /// Number of foreground pixels the estimate is based on.
    pub foreground_pixels: usize,
}

/// Image preprocessor for the OCR pipeline.
///
/// Grayscale, adaptive Gaussian binarization, median denoise, then deskew.
pub struct ImagePreprocessor {
    config: PreprocessConfig,
}

impl ImagePreprocessor {
    /// Create a new preprocessor with default settings.
    pub fn new() -> Self {
        Self::with_config(PreprocessConfig::default())
    }

    pub fn with_config(config: PreprocessConfig) -> Self {
        Self { config }
    }

    /// Normalize one page image for OCR.
    pub fn preprocess(&self, image: &DynamicImage) -> Result<GrayImage, OcrError> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(OcrError::InvalidImage(format!(
                "empty page image ({}x{})",
                width, height
            )));
        }

        let gray = image.to_luma8();
        let binary = self.adaptive_threshold(&gray);

        let denoised = if self.config.median_radius > 0 {
            median_filter(&binary, self.config.median_radius, self.config.median_radius)
        } else {
            binary
        };

        if !self.config.deskew {
            return Ok(denoised);
        }

        match estimate_skew(&denoised) {
            Some(skew) if skew.angle_degrees.abs() > self.config.min_skew_degrees => {
                debug!(
                    "Deskewing page by {:.2} degrees ({} foreground pixels)",
                    skew.angle_degrees, skew.foreground_pixels
                );
                Ok(rotate_about_center(
                    &denoised,
                    -skew.angle_degrees.to_radians(),
                    Interpolation::Bicubic,
                    Luma([BACKGROUND]),
                ))
            }
            Some(skew) => {
                debug!("Skew {:.2} degrees below threshold, not rotating", skew.angle_degrees);
                Ok(denoised)
            }
            None => Ok(denoised),
        }
    }

    /// Binarize against a Gaussian-weighted local mean.
    ///
    /// A pixel stays white when it is brighter than the weighted mean of its
    /// block minus the configured offset.
    fn adaptive_threshold(&self, image: &GrayImage) -> GrayImage {
        let block_size = self.config.threshold_block_size.max(3) | 1;
        // OpenCV's sigma for a kernel of this size.
        let sigma = 0.3 * ((block_size as f32 - 1.0) * 0.5 - 1.0) + 0.8;
        let local_mean = gaussian_blur_f32(image, sigma);

        let (width, height) = image.dimensions();
        let mut result = GrayImage::new(width, height);

        for (x, y, pixel) in image.enumerate_pixels() {
            let threshold = local_mean.get_pixel(x, y)[0] as f32 - self.config.threshold_offset;
            let output = if pixel[0] as f32 > threshold {
                BACKGROUND
            } else {
                FOREGROUND
            };
            result.put_pixel(x, y, Luma([output]));
        }

        result
    }
}

impl Default for ImagePreprocessor {
    fn default() -> Self {
        Self::new()
    }
}

/// Estimate page skew from the minimum-area rectangle around all
/// foreground pixels.
///
/// Returns `None` when there are too few foreground pixels to span an area.
pub fn estimate_skew(image: &GrayImage) -> Option<SkewEstimate> {
    let (width, height) = image.dimensions();
    let mut points = Vec::new();
    let mut foreground_pixels = 0usize;

    // Row extremes are enough: interior points never lie on the hull.
    for y in 0..height {
        let mut first = None;
        let mut last = None;
        for x in 0..width {
            if image.get_pixel(x, y)[0] == FOREGROUND {
                foreground_pixels += 1;
                first.get_or_insert(x);
                last = Some(x);
            }
        }
        if let (Some(first), Some(last)) = (first, last) {
            points.push(Point::new(first as i32, y as i32));
            if last != first {
                points.push(Point::new(last as i32, y as i32));
            }
        }
    }

    if points.len() < 3 {
        return None;
    }

    let angle = rect_angle(&min_area_rect(&points))?;
    Some(SkewEstimate {
        angle_degrees: normalize_skew(angle.to_degrees()) as f32,
        foreground_pixels,
    })
}

/// Angle in radians of the first edge of a rectangle, or `None` when the
/// rectangle has no area.
fn rect_angle(rect: &[Point<i32>; 4]) -> Option<f64> {
    let edge = |a: Point<i32>, b: Point<i32>| ((b.x - a.x) as f64, (b.y - a.y) as f64);
    let (ux, uy) = edge(rect[0], rect[1]);
    let (vx, vy) = edge(rect[1], rect[2]);

    if (ux * vy - uy * vx).abs() < f64::EPSILON {
        return None;
    }
    Some(uy.atan2(ux))
}

/// Fold any rectangle edge angle into `(-45, 45]` degrees.
fn normalize_skew(mut degrees: f64) -> f64 {
    while degrees > 45.0 {
        degrees -= 90.0;
    }
    while degrees <= -45.0 {
        degrees += 90.0;
    }
    degrees
}
