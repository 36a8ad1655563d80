//! Output assembly: encoded pages → a new PDF.
//!
//! [`PdfComposer`] is the seam to the PDF writer. [`LopdfComposer`] builds a
//! minimal document with `lopdf`: one page per image, each page drawing a
//! single `DCTDecode` image XObject. JPEG bytes are embedded as-is.

use crate::config::PageGeometry;
use crate::error::ExtractError;
use crate::pipeline::encode::EncodedPage;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};
use tracing::debug;

/// A4 portrait in points.
pub const A4_POINTS: (f32, f32) = (595.28, 841.89);

const POINTS_PER_MM: f32 = 72.0 / 25.4;

/// Builds an output document from encoded pages.
pub trait PdfComposer: Send + Sync {
    /// One output page per entry, in order; returns the serialised PDF.
    fn compose(&self, pages: &[EncodedPage]) -> Result<Vec<u8>, ExtractError>;
}

/// Page box and image rectangle for one output page, in points with the
/// origin at the bottom-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub page_width: f32,
    pub page_height: f32,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl PageGeometry {
    /// Where `page` lands on its output page.
    pub fn place(&self, page: &EncodedPage) -> Placement {
        match *self {
            PageGeometry::Native => Placement {
                page_width: page.native_width,
                page_height: page.native_height,
                x: 0.0,
                y: 0.0,
                width: page.native_width,
                height: page.native_height,
            },
            PageGeometry::LegacyA4 { divisor } => {
                let (page_width, page_height) = A4_POINTS;
                let width = page.pixel_width as f32 / divisor * POINTS_PER_MM;
                let height = page.pixel_height as f32 / divisor * POINTS_PER_MM;
                Placement {
                    page_width,
                    page_height,
                    x: 0.0,
                    // Anchored at the top edge.
                    y: page_height - height,
                    width,
                    height,
                }
            }
        }
    }
}

/// [`PdfComposer`] writing with `lopdf`.
#[derive(Debug, Clone, Default)]
pub struct LopdfComposer {
    pub geometry: PageGeometry,
}

impl LopdfComposer {
    pub fn new(geometry: PageGeometry) -> Self {
        Self { geometry }
    }

    fn add_page(
        &self,
        doc: &mut Document,
        pages_id: ObjectId,
        page: &EncodedPage,
    ) -> Result<ObjectId, ExtractError> {
        let placement = self.geometry.place(page);

        let image = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => page.pixel_width as i64,
                "Height" => page.pixel_height as i64,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
                "Filter" => "DCTDecode",
            },
            page.jpeg.clone(),
        )
        .with_compression(false);
        let image_id = doc.add_object(image);

        let content = Content {
            operations: vec![
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![
                        Object::Real(placement.width),
                        0.into(),
                        0.into(),
                        Object::Real(placement.height),
                        Object::Real(placement.x),
                        Object::Real(placement.y),
                    ],
                ),
                Operation::new("Do", vec![Object::Name(b"Im0".to_vec())]),
                Operation::new("Q", vec![]),
            ],
        };
        let encoded = content.encode().map_err(|e| ExtractError::CompositionFailure {
            detail: format!("content stream for page {}: {e}", page.page_index + 1),
        })?;
        let content_id = doc.add_object(Stream::new(Dictionary::new(), encoded));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![
                0.into(),
                0.into(),
                Object::Real(placement.page_width),
                Object::Real(placement.page_height),
            ],
            "Resources" => dictionary! {
                "XObject" => dictionary! { "Im0" => image_id },
            },
            "Contents" => content_id,
        });

        debug!(
            "Placed source page {} on a {:.1}x{:.1} pt page",
            page.page_index + 1,
            placement.page_width,
            placement.page_height
        );
        Ok(page_id)
    }
}

impl PdfComposer for LopdfComposer {
    fn compose(&self, pages: &[EncodedPage]) -> Result<Vec<u8>, ExtractError> {
        if pages.is_empty() {
            return Err(ExtractError::CompositionFailure {
                detail: "no pages to compose".into(),
            });
        }

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let mut kids = Vec::with_capacity(pages.len());
        for page in pages {
            kids.push(Object::Reference(self.add_page(&mut doc, pages_id, page)?));
        }

        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Count" => kids.len() as i64,
                "Kids" => kids,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buffer = Vec::new();
        doc.save_to(&mut buffer)
            .map_err(|e| ExtractError::CompositionFailure {
                detail: format!("save failed: {e}"),
            })?;
        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::ImageEncoder;

    fn encoded(index: usize, px: (u32, u32), native: (f32, f32)) -> EncodedPage {
        let img = image::RgbImage::from_pixel(px.0, px.1, image::Rgb([10, 120, 240]));
        let mut jpeg = Vec::new();
        image::codecs::jpeg::JpegEncoder::new_with_quality(&mut jpeg, 80)
            .write_image(img.as_raw(), px.0, px.1, image::ExtendedColorType::Rgb8)
            .unwrap();
        EncodedPage {
            page_index: index,
            jpeg,
            pixel_width: px.0,
            pixel_height: px.1,
            native_width: native.0,
            native_height: native.1,
        }
    }

    fn media_box(doc: &Document, page_id: ObjectId) -> Vec<f32> {
        doc.get_dictionary(page_id)
            .unwrap()
            .get(b"MediaBox")
            .unwrap()
            .as_array()
            .unwrap()
            .iter()
            .map(|o| o.as_float().unwrap())
            .collect()
    }

    #[test]
    fn native_geometry_uses_source_page_size() {
        let p = encoded(0, (918, 1188), (612.0, 792.0));
        let placement = PageGeometry::Native.place(&p);
        assert_eq!((placement.page_width, placement.page_height), (612.0, 792.0));
        assert_eq!((placement.width, placement.height), (612.0, 792.0));
    }

    #[test]
    fn legacy_geometry_anchors_top_left_on_a4() {
        let p = encoded(0, (800, 400), (100.0, 100.0));
        let placement = PageGeometry::legacy().place(&p);
        // 800 px / 4 = 200 mm wide, 100 mm tall.
        assert!((placement.width - 200.0 * POINTS_PER_MM).abs() < 0.01);
        assert!((placement.height - 100.0 * POINTS_PER_MM).abs() < 0.01);
        assert_eq!((placement.page_width, placement.page_height), A4_POINTS);
        assert!((placement.y + placement.height - A4_POINTS.1).abs() < 0.01);
    }

    #[test]
    fn composes_one_page_per_image() {
        let composer = LopdfComposer::default();
        let bytes = composer
            .compose(&[
                encoded(0, (30, 40), (20.0, 26.5)),
                encoded(4, (60, 40), (40.0, 26.5)),
            ])
            .unwrap();
        assert!(bytes.starts_with(b"%PDF-1.5"));

        let doc = Document::load_mem(&bytes).unwrap();
        let pages = doc.get_pages();
        assert_eq!(pages.len(), 2);
        assert_eq!(media_box(&doc, pages[&1]), vec![0.0, 0.0, 20.0, 26.5]);
        assert_eq!(media_box(&doc, pages[&2]), vec![0.0, 0.0, 40.0, 26.5]);
    }

    #[test]
    fn image_bytes_are_embedded_unchanged() {
        let page = encoded(0, (16, 16), (16.0, 16.0));
        let bytes = LopdfComposer::default().compose(std::slice::from_ref(&page)).unwrap();
        let doc = Document::load_mem(&bytes).unwrap();

        let image = doc
            .objects
            .values()
            .filter_map(|o| o.as_stream().ok())
            .find(|s| s.dict.get(b"Subtype").and_then(|v| v.as_name()).ok() == Some(b"Image".as_slice()))
            .expect("image XObject present");
        assert_eq!(image.dict.get(b"Filter").unwrap().as_name().unwrap(), b"DCTDecode");
        assert_eq!(image.content, page.jpeg);
    }

    #[test]
    fn empty_input_is_a_composition_failure() {
        let err = LopdfComposer::default().compose(&[]).unwrap_err();
        assert!(matches!(err, ExtractError::CompositionFailure { .. }));
    }
}
