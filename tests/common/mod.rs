//! Shared test helpers: an in-process renderer and lopdf fixture builders.
//!
//! `FakeRenderer` parses with lopdf and paints each page a solid colour that
//! depends on its index, so tests can tell which source page ended up where
//! without a pdfium binary.

#![allow(dead_code)]

use firstlast_pdf::{ExtractError, PageRaster, PdfRenderer, RenderableDocument};
use image::{DynamicImage, Rgb, RgbImage};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};
use std::sync::Mutex;

/// Native width in points of source page `index`.
pub fn native_width(index: usize) -> f32 {
    100.0 + index as f32 * 10.0
}

pub const NATIVE_HEIGHT: f32 = 150.0;

/// Fill colour of source page `index`.
pub fn page_colour(index: usize) -> Rgb<u8> {
    Rgb([200, (index * 50).min(255) as u8, 30])
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Open,
    Render(usize),
}

#[derive(Default)]
pub struct FakeRenderer {
    calls: Mutex<Vec<Call>>,
    fail_on_page: Option<usize>,
}

impl FakeRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rendering page `index` of any document fails.
    pub fn failing_on(index: usize) -> Self {
        Self {
            fail_on_page: Some(index),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn open_count(&self) -> usize {
        self.calls().iter().filter(|c| **c == Call::Open).count()
    }

    pub fn rendered(&self) -> Vec<usize> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Render(i) => Some(i),
                Call::Open => None,
            })
            .collect()
    }
}

impl PdfRenderer for FakeRenderer {
    fn open<'a>(
        &'a self,
        bytes: &'a [u8],
        _password: Option<&str>,
    ) -> Result<Box<dyn RenderableDocument + 'a>, ExtractError> {
        self.calls.lock().unwrap().push(Call::Open);
        let doc = Document::load_mem(bytes).map_err(|e| ExtractError::MalformedDocument {
            detail: e.to_string(),
        })?;
        Ok(Box::new(FakeDocument {
            renderer: self,
            page_count: doc.get_pages().len(),
        }))
    }
}

struct FakeDocument<'a> {
    renderer: &'a FakeRenderer,
    page_count: usize,
}

impl RenderableDocument for FakeDocument<'_> {
    fn page_count(&self) -> usize {
        self.page_count
    }

    fn page_size(&self, index: usize) -> Result<(f32, f32), ExtractError> {
        Ok((native_width(index), NATIVE_HEIGHT))
    }

    fn render_page(&self, index: usize, scale: f32) -> Result<PageRaster, ExtractError> {
        self.renderer.calls.lock().unwrap().push(Call::Render(index));
        if self.renderer.fail_on_page == Some(index) {
            return Err(ExtractError::RenderFailure {
                page: index + 1,
                detail: "simulated render failure".into(),
            });
        }
        let (w, h) = (native_width(index), NATIVE_HEIGHT);
        let px_w = (w * scale).round() as u32;
        let px_h = (h * scale).round() as u32;
        Ok(PageRaster {
            page_index: index,
            image: DynamicImage::ImageRgb8(RgbImage::from_pixel(px_w, px_h, page_colour(index))),
            scale,
            native_width: w,
            native_height: h,
        })
    }
}

// ── Fixtures ─────────────────────────────────────────────────────────────────

/// A valid PDF with `pages` pages, each carrying its page number as text.
pub fn pdf_with_pages(pages: usize) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });

    let mut kids: Vec<Object> = Vec::with_capacity(pages);
    for n in 1..=pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 24.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
                Operation::new("Tj", vec![Object::string_literal(format!("Page {n}"))]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(
            lopdf::Dictionary::new(),
            content.encode().unwrap(),
        ));
        let page_id: ObjectId = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Contents" => content_id,
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => font_id },
            },
        });
        kids.push(page_id.into());
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Count" => pages as i64,
            "Kids" => kids,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut out = Vec::new();
    doc.save_to(&mut out).unwrap();
    out
}

/// Bytes that start like a PDF but cannot be parsed.
pub fn malformed_pdf() -> Vec<u8> {
    b"%PDF-1.4\nthis is not a real document\n".to_vec()
}

// ── Output inspection ────────────────────────────────────────────────────────

/// `[x0, y0, x1, y1]` of every page of `bytes`, in page order.
pub fn media_boxes(bytes: &[u8]) -> Vec<Vec<f32>> {
    let doc = Document::load_mem(bytes).unwrap();
    doc.get_pages()
        .values()
        .map(|&id| {
            doc.get_dictionary(id)
                .unwrap()
                .get(b"MediaBox")
                .unwrap()
                .as_array()
                .unwrap()
                .iter()
                .map(|o| o.as_float().unwrap())
                .collect()
        })
        .collect()
}

/// Decoded image XObject of every page of `bytes`, in page order.
pub fn page_images(bytes: &[u8]) -> Vec<RgbImage> {
    let doc = Document::load_mem(bytes).unwrap();
    doc.get_pages()
        .values()
        .map(|&id| {
            let page = doc.get_dictionary(id).unwrap();
            let resources = page.get(b"Resources").unwrap().as_dict().unwrap();
            let xobjects = resources.get(b"XObject").unwrap().as_dict().unwrap();
            let (_, reference) = xobjects.iter().next().unwrap();
            let stream = doc
                .get_object(reference.as_reference().unwrap())
                .unwrap()
                .as_stream()
                .unwrap();
            image::load_from_memory(&stream.content).unwrap().to_rgb8()
        })
        .collect()
}

/// Whether two colours are within JPEG error of each other.
pub fn close_to(actual: Rgb<u8>, expected: Rgb<u8>) -> bool {
    actual
        .0
        .iter()
        .zip(expected.0.iter())
        .all(|(a, e)| (*a as i16 - *e as i16).abs() <= 12)
}
