//! Page rendering through poppler's `pdftoppm`.

use std::path::{Path, PathBuf};
use std::process::Command;

use image::DynamicImage;
use tracing::{debug, info, warn};

use super::{PageRasterizer, Result};
use crate::error::PdfError;

const PAGE_PREFIX: &str = "page";

/// Rasterizer that shells out to `pdftoppm`.
pub struct PopplerRasterizer {
    program: PathBuf,
}

impl PopplerRasterizer {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for PopplerRasterizer {
    fn default() -> Self {
        Self::new("pdftoppm")
    }
}

impl PageRasterizer for PopplerRasterizer {
    fn rasterize(&self, pdf_path: &Path, dpi: u32) -> Result<Vec<DynamicImage>> {
        let temp_dir = tempfile::Builder::new()
            .prefix("billie_pages_")
            .tempdir()
            .map_err(|e| PdfError::Rasterize(format!("failed to create temp dir: {}", e)))?;

        debug!("Running {} at {} DPI on {}", self.program.display(), dpi, pdf_path.display());

        let output = Command::new(&self.program)
            .arg("-png")
            .arg("-r")
            .arg(dpi.to_string())
            .arg(pdf_path)
            .arg(temp_dir.path().join(PAGE_PREFIX))
            .output()
            .map_err(|e| {
                PdfError::Rasterize(format!("{} failed to start: {}", self.program.display(), e))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PdfError::Rasterize(format!(
                "{} exited with {}: {}",
                self.program.display(),
                output.status,
                stderr.trim()
            )));
        }

        let mut page_files = Vec::new();
        for entry in std::fs::read_dir(temp_dir.path())
            .map_err(|e| PdfError::Rasterize(e.to_string()))?
        {
            let path = entry.map_err(|e| PdfError::Rasterize(e.to_string()))?.path();
            if let Some(number) = page_number(&path) {
                page_files.push((number, path));
            }
        }

        if page_files.is_empty() {
            warn!("{} rendered no pages from {}", self.program.display(), pdf_path.display());
            return Ok(Vec::new());
        }

        page_files.sort_by_key(|(number, _)| *number);

        let pages = page_files
            .iter()
            .map(|(number, path)| {
                image::open(path).map_err(|e| {
                    PdfError::Rasterize(format!("failed to load rendered page {}: {}", number, e))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        info!("Rasterized {} page(s) from {}", pages.len(), pdf_path.display());
        Ok(pages)
    }
}

/// Parse the page number out of `page-7.png` / `page-07.png`.
fn page_number(path: &Path) -> Option<u32> {
    if path.extension().and_then(|e| e.to_str()) != Some("png") {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    let (prefix, number) = stem.rsplit_once('-')?;
    if prefix != PAGE_PREFIX {
        return None;
    }
    number.parse().ok()
}
