//! Page images pulled straight out of scanned PDFs using lopdf.

use std::path::Path;

use image::{DynamicImage, GrayImage, RgbImage};
use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::{debug, trace};

use super::{PageRasterizer, Result};
use crate::error::PdfError;

/// Rasterizer for scanned PDFs that embed one image per page.
///
/// Returns the largest decodable image on each page at its native
/// resolution; the requested DPI is not applied.
pub struct EmbeddedImageRasterizer;

impl EmbeddedImageRasterizer {
    pub fn new() -> Self {
        Self
    }

    /// Load a document, decrypting PDFs protected by an empty password.
    ///
    /// A document without pages loads fine and rasterizes to no images.
    pub fn load(&self, data: &[u8]) -> Result<Document> {
        let mut doc = Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;

        if doc.is_encrypted() {
            if doc.decrypt("").is_err() {
                return Err(PdfError::Encrypted);
            }
            debug!("Decrypted PDF with empty password");
        }

        Ok(doc)
    }

    /// Extract the page image of a single page (1-indexed).
    pub fn page_image(&self, doc: &Document, page: u32) -> Result<DynamicImage> {
        let pages = doc.get_pages();
        let page_id = pages.get(&page).ok_or(PdfError::InvalidPage(page))?;

        let mut best: Option<DynamicImage> = None;

        if let Some(resources) = page_resources(doc, *page_id) {
            if let Ok(xobjects) = resources.get(b"XObject") {
                if let Ok((_, Object::Dictionary(xobj_dict))) = doc.dereference(xobjects) {
                    for (_name, obj_ref) in xobj_dict.iter() {
                        let Ok((_, obj)) = doc.dereference(obj_ref) else {
                            continue;
                        };
                        if let Some(img) = decode_image_object(doc, obj) {
                            let area = img.width() as u64 * img.height() as u64;
                            let best_area = best
                                .as_ref()
                                .map(|b| b.width() as u64 * b.height() as u64)
                                .unwrap_or(0);
                            if area > best_area {
                                best = Some(img);
                            }
                        }
                    }
                }
            }
        }

        best.ok_or_else(|| {
            PdfError::ImageExtraction(format!("no decodable image on page {}", page))
        })
    }
}

impl Default for EmbeddedImageRasterizer {
    fn default() -> Self {
        Self::new()
    }
}

impl PageRasterizer for EmbeddedImageRasterizer {
    fn rasterize(&self, pdf_path: &Path, dpi: u32) -> Result<Vec<DynamicImage>> {
        let data = std::fs::read(pdf_path).map_err(|e| PdfError::Parse(e.to_string()))?;
        let doc = self.load(&data)?;

        debug!(
            "Extracting embedded page images from {} (requested {} DPI ignored)",
            pdf_path.display(),
            dpi
        );

        doc.get_pages()
            .keys()
            .map(|&page| self.page_image(&doc, page))
            .collect()
    }
}

fn decode_image_object(doc: &Document, obj: &Object) -> Option<DynamicImage> {
    let Object::Stream(stream) = obj else {
        return None;
    };
    let dict = &stream.dict;

    if dict.get(b"Subtype").ok()?.as_name().ok()? != b"Image" {
        return None;
    }

    let width = dict.get(b"Width").ok()?.as_i64().ok()? as u32;
    let height = dict.get(b"Height").ok()?.as_i64().ok()? as u32;
    trace!("Found image object: {}x{}", width, height);

    if let Ok(filter) = dict.get(b"Filter") {
        let filter_name = match filter {
            Object::Name(name) => Some(name.as_slice()),
            Object::Array(arr) => arr.first().and_then(|o| o.as_name().ok()),
            _ => None,
        };

        match filter_name {
            Some(b"DCTDecode") => {
                return image::load_from_memory_with_format(
                    &stream.content,
                    image::ImageFormat::Jpeg,
                )
                .ok();
            }
            Some(b"JPXDecode") | Some(b"CCITTFaxDecode") | Some(b"JBIG2Decode") => {
                trace!("Skipping unsupported image filter {:?}", filter_name);
                return None;
            }
            _ => {}
        }
    }

    let data = stream
        .decompressed_content()
        .unwrap_or_else(|_| stream.content.clone());

    let color_space = dict
        .get(b"ColorSpace")
        .ok()
        .and_then(|o| match o {
            Object::Name(name) => Some(name.as_slice()),
            Object::Array(arr) => arr.first().and_then(|o| o.as_name().ok()),
            Object::Reference(r) => doc.get_object(*r).ok().and_then(|o| o.as_name().ok()),
            _ => None,
        })
        .unwrap_or(b"DeviceRGB");

    let bits = dict
        .get(b"BitsPerComponent")
        .ok()
        .and_then(|o| o.as_i64().ok())
        .unwrap_or(8);

    raw_to_image(&data, width, height, color_space, bits)
}

fn raw_to_image(
    data: &[u8],
    width: u32,
    height: u32,
    color_space: &[u8],
    bits_per_component: i64,
) -> Option<DynamicImage> {
    if bits_per_component != 8 {
        trace!("Unsupported bits per component: {}", bits_per_component);
        return None;
    }

    let pixels = width as usize * height as usize;

    match color_space {
        b"DeviceRGB" | b"RGB" if data.len() >= pixels * 3 => {
            RgbImage::from_raw(width, height, data[..pixels * 3].to_vec())
                .map(DynamicImage::ImageRgb8)
        }
        b"DeviceGray" | b"G" if data.len() >= pixels => {
            GrayImage::from_raw(width, height, data[..pixels].to_vec())
                .map(DynamicImage::ImageLuma8)
        }
        _ => {
            trace!(
                "Could not decode image: data_len={}, colorspace={:?}",
                data.len(),
                String::from_utf8_lossy(color_space)
            );
            None
        }
    }
}

/// Resources dictionary for a page, following `Parent` inheritance.
fn page_resources(doc: &Document, node_id: ObjectId) -> Option<Dictionary> {
    let Ok(Object::Dictionary(dict)) = doc.get_object(node_id) else {
        return None;
    };

    if let Ok(resources) = dict.get(b"Resources") {
        if let Ok((_, Object::Dictionary(res_dict))) = doc.dereference(resources) {
            return Some(res_dict.clone());
        }
    }

    match dict.get(b"Parent") {
        Ok(Object::Reference(parent_id)) => page_resources(doc, *parent_id),
        _ => None,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use lopdf::dictionary;

    /// A well-formed PDF whose page tree is empty.
    pub(crate) fn empty_document() -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.add_object(lopdf::dictionary! {
            "Type" => "Pages",
            "Kids" => Vec::<Object>::new(),
            "Count" => 0,
        });
        let catalog_id = doc.add_object(lopdf::dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    #[test]
    fn test_raw_gray_image() {
        let img = raw_to_image(&[0, 128, 255, 64], 2, 2, b"DeviceGray", 8).unwrap();
        assert_eq!((img.width(), img.height()), (2, 2));
        let gray = img.to_luma8();
        assert_eq!(gray.get_pixel(1, 0)[0], 128);
        assert_eq!(gray.get_pixel(0, 1)[0], 255);
    }

    #[test]
    fn test_raw_rgb_image_too_short() {
        assert!(raw_to_image(&[0; 5], 2, 1, b"DeviceRGB", 8).is_none());
    }

    #[test]
    fn test_raw_unsupported_bit_depth() {
        assert!(raw_to_image(&[0; 4], 2, 2, b"DeviceGray", 1).is_none());
    }

    #[test]
    fn test_load_garbage_is_parse_error() {
        let err = EmbeddedImageRasterizer::new().load(b"not a pdf").unwrap_err();
        assert!(matches!(err, PdfError::Parse(_)));
    }

    #[test]
    fn test_zero_page_document_has_no_images() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.pdf");
        std::fs::write(&path, empty_document()).unwrap();

        let pages = EmbeddedImageRasterizer::new().rasterize(&path, 300).unwrap();
        assert!(pages.is_empty());
    }
}
