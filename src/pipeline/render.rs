//! PDF reading and rasterisation.
//!
//! [`PdfRenderer`] is the seam to the PDF reader: it parses a byte buffer into
//! a [`RenderableDocument`] that knows its page count and renders single
//! pages. [`PdfiumRenderer`] implements it on top of `pdfium-render`.
//!
//! pdfium is not async-safe; callers run these methods inside
//! `spawn_blocking` (see [`crate::pipeline::extract`]).

use crate::document::PageRaster;
use crate::error::ExtractError;
use pdfium_provision::{DownloadProgress, Provisioner};
use pdfium_render::prelude::*;
use tracing::{debug, info};

/// Parses PDF bytes into renderable documents.
pub trait PdfRenderer: Send + Sync {
    /// Parse `bytes`. Fails with [`ExtractError::MalformedDocument`] when the
    /// buffer is not a readable PDF.
    fn open<'a>(
        &'a self,
        bytes: &'a [u8],
        password: Option<&str>,
    ) -> Result<Box<dyn RenderableDocument + 'a>, ExtractError>;
}

/// A parsed document.
pub trait RenderableDocument {
    fn page_count(&self) -> usize;

    /// Native `(width, height)` of a page in PDF points.
    fn page_size(&self, index: usize) -> Result<(f32, f32), ExtractError>;

    /// Render page `index` (0-based) with both dimensions multiplied by `scale`.
    fn render_page(&self, index: usize, scale: f32) -> Result<PageRaster, ExtractError>;
}

/// [`PdfRenderer`] backed by a bound pdfium library.
pub struct PdfiumRenderer {
    pdfium: Pdfium,
}

// SAFETY: with the `thread_safe` feature every pdfium call goes through
// pdfium-render's global lock, and documents never outlive a single `open`.
unsafe impl Send for PdfiumRenderer {}
unsafe impl Sync for PdfiumRenderer {}

impl PdfiumRenderer {
    pub fn new(pdfium: Pdfium) -> Self {
        Self { pdfium }
    }

    /// Locate (downloading on first use if needed) and bind libpdfium.
    ///
    /// Call once before the first extraction; the download is blocking.
    pub fn initialize(
        provisioner: &Provisioner,
        on_progress: Option<DownloadProgress<'_>>,
    ) -> Result<Self, ExtractError> {
        let source = provisioner
            .ensure(on_progress)
            .map_err(|e| ExtractError::EngineUnavailable(e.to_string()))?;
        info!("Binding PDFium from {}", source.path().display());
        let pdfium = pdfium_provision::bind_library(source.path())
            .map_err(|e| ExtractError::EngineUnavailable(e.to_string()))?;
        Ok(Self::new(pdfium))
    }
}

impl PdfRenderer for PdfiumRenderer {
    fn open<'a>(
        &'a self,
        bytes: &'a [u8],
        password: Option<&str>,
    ) -> Result<Box<dyn RenderableDocument + 'a>, ExtractError> {
        let document = self
            .pdfium
            .load_pdf_from_byte_slice(bytes, password)
            .map_err(|e| classify_load_error(&e, password.is_some()))?;
        debug!("PDF loaded: {} pages", document.pages().len());
        Ok(Box::new(PdfiumDocument { document }))
    }
}

fn classify_load_error(err: &PdfiumError, had_password: bool) -> ExtractError {
    let detail = format!("{:?}", err);
    if detail.contains("Password") || detail.contains("password") {
        if had_password {
            ExtractError::WrongPassword
        } else {
            ExtractError::PasswordRequired
        }
    } else {
        ExtractError::MalformedDocument { detail }
    }
}

struct PdfiumDocument<'a> {
    document: PdfDocument<'a>,
}

impl<'a> PdfiumDocument<'a> {
    fn page(&self, index: usize) -> Result<PdfPage<'a>, ExtractError> {
        let total = self.page_count();
        if index >= total {
            return Err(ExtractError::RenderFailure {
                page: index + 1,
                detail: format!("out of range (document has {total} pages)"),
            });
        }
        self.document
            .pages()
            .get(index as u16)
            .map_err(|e| ExtractError::RenderFailure {
                page: index + 1,
                detail: format!("{:?}", e),
            })
    }
}

impl RenderableDocument for PdfiumDocument<'_> {
    fn page_count(&self) -> usize {
        self.document.pages().len() as usize
    }

    fn page_size(&self, index: usize) -> Result<(f32, f32), ExtractError> {
        let page = self.page(index)?;
        Ok((page.width().value, page.height().value))
    }

    fn render_page(&self, index: usize, scale: f32) -> Result<PageRaster, ExtractError> {
        let page = self.page(index)?;
        let (native_width, native_height) = (page.width().value, page.height().value);

        let render_config = PdfRenderConfig::new().scale_page_by_factor(scale);
        let bitmap = page
            .render_with_config(&render_config)
            .map_err(|e| ExtractError::RenderFailure {
                page: index + 1,
                detail: format!("{:?}", e),
            })?;

        let image = bitmap.as_image();
        debug!(
            "Rendered page {} at {}x → {}x{} px",
            index + 1,
            scale,
            image.width(),
            image.height()
        );

        Ok(PageRaster {
            page_index: index,
            image,
            scale,
            native_width,
            native_height,
        })
    }
}
