//! Image encoding: [`PageRaster`] → JPEG bytes.
//!
//! Alpha is dropped; pdfium renders pages onto an opaque white background.

use crate::document::PageRaster;
use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, ImageEncoder};
use tracing::debug;

/// A JPEG ready to be placed on an output page.
#[derive(Debug, Clone)]
pub struct EncodedPage {
    /// 0-based index of the source page.
    pub page_index: usize,
    pub jpeg: Vec<u8>,
    pub pixel_width: u32,
    pub pixel_height: u32,
    pub native_width: f32,
    pub native_height: f32,
}

/// JPEG-encode a raster at `quality` (1–100).
pub fn encode_page(raster: &PageRaster, quality: u8) -> Result<EncodedPage, image::ImageError> {
    let rgb = raster.image.to_rgb8();
    let (width, height) = rgb.dimensions();

    let mut jpeg = Vec::new();
    JpegEncoder::new_with_quality(&mut jpeg, quality).write_image(
        rgb.as_raw(),
        width,
        height,
        ExtendedColorType::Rgb8,
    )?;
    debug!(
        "Encoded page {} ({}x{}) → {} bytes JPEG",
        raster.page_index + 1,
        width,
        height,
        jpeg.len()
    );

    Ok(EncodedPage {
        page_index: raster.page_index,
        jpeg,
        pixel_width: width,
        pixel_height: height,
        native_width: raster.native_width,
        native_height: raster.native_height,
    })
}
