//! Documents flowing through the pipeline and the result records kept per
//! batch.

use image::DynamicImage;
use serde::Serialize;
use std::sync::Arc;

/// Appended to the input stem to name the output file.
pub const OUTPUT_SUFFIX: &str = "_first_last_pages.pdf";

/// An existing PDF selected for processing. Immutable.
#[derive(Debug, Clone)]
pub struct InputDocument {
    pub name: String,
    pub bytes: Arc<[u8]>,
}

impl InputDocument {
    pub fn new(name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// One page rendered to pixels.
#[derive(Debug, Clone)]
pub struct PageRaster {
    /// 0-based index of the source page.
    pub page_index: usize,
    pub image: DynamicImage,
    /// Scale the page was rendered at, relative to its native size.
    pub scale: f32,
    /// Native page width in PDF points.
    pub native_width: f32,
    /// Native page height in PDF points.
    pub native_height: f32,
}

impl PageRaster {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// How an output document was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputKind {
    /// Fewer than two pages: the input bytes are returned untouched.
    Passthrough,
    /// Two image pages built from the first and last source pages.
    Composed,
}

/// The document produced for one input.
#[derive(Debug, Clone, Serialize)]
pub struct OutputDocument {
    pub name: String,
    #[serde(skip)]
    pub bytes: Arc<[u8]>,
    pub kind: OutputKind,
    /// Page count of the source document.
    pub source_page_count: usize,
}

impl OutputDocument {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// One processed file, recorded in arrival order.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessingResult {
    pub input_name: String,
    pub input_size: u64,
    pub output: OutputDocument,
}

/// Name of the output file for an input called `input_name`.
///
/// A trailing `.pdf` is matched case-insensitively and replaced; any other
/// name is kept whole as the stem.
pub fn output_file_name(input_name: &str) -> String {
    let stem = match input_name.len().checked_sub(4) {
        Some(cut)
            if input_name.is_char_boundary(cut)
                && input_name[cut..].eq_ignore_ascii_case(".pdf") =>
        {
            &input_name[..cut]
        }
        _ => input_name,
    };
    format!("{stem}{OUTPUT_SUFFIX}")
}

/// Human-readable byte count: `0 Bytes`, `512 Bytes`, `1.5 KB`, `20 MB`.
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut value = bytes as f64;
    let mut exp = 0;
    while value >= 1024.0 && exp < UNITS.len() - 1 {
        value /= 1024.0;
        exp += 1;
    }

    let rounded = format!("{value:.2}");
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{trimmed} {}", UNITS[exp])
}
