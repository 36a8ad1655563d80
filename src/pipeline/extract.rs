//! The first/last page extraction pipeline for a single document.

use crate::config::ExtractionConfig;
use crate::document::{output_file_name, InputDocument, OutputDocument, OutputKind};
use crate::error::ExtractError;
use crate::pipeline::compose::{LopdfComposer, PdfComposer};
use crate::pipeline::encode::{encode_page, EncodedPage};
use crate::pipeline::render::{PdfRenderer, RenderableDocument};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Page count and edge-page sizes, read without rendering.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentInfo {
    pub page_count: usize,
    /// Native size in points of the first page.
    pub first_page_size: Option<(f32, f32)>,
    /// Native size in points of the last page.
    pub last_page_size: Option<(f32, f32)>,
}

/// Turns one PDF into a two-page PDF of its first and last page.
///
/// Stateless between calls; clone it freely (the collaborators are shared).
#[derive(Clone)]
pub struct Extractor {
    renderer: Arc<dyn PdfRenderer>,
    composer: Arc<dyn PdfComposer>,
    config: ExtractionConfig,
}

impl std::fmt::Debug for Extractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Extractor")
            .field("renderer", &"<dyn PdfRenderer>")
            .field("composer", &"<dyn PdfComposer>")
            .field("config", &self.config)
            .finish()
    }
}

impl Extractor {
    /// An extractor writing output with [`LopdfComposer`] laid out per
    /// `config.page_geometry`.
    pub fn new(renderer: Arc<dyn PdfRenderer>, config: ExtractionConfig) -> Self {
        let composer = Arc::new(LopdfComposer::new(config.page_geometry));
        Self::with_composer(renderer, composer, config)
    }

    pub fn with_composer(
        renderer: Arc<dyn PdfRenderer>,
        composer: Arc<dyn PdfComposer>,
        config: ExtractionConfig,
    ) -> Self {
        Self {
            renderer,
            composer,
            config,
        }
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Extract on the blocking thread pool.
    ///
    /// The whole call runs in one `spawn_blocking` task.
    pub async fn extract(&self, input: &InputDocument) -> Result<OutputDocument, ExtractError> {
        let this = self.clone();
        let input = input.clone();
        tokio::task::spawn_blocking(move || this.extract_blocking(&input))
            .await
            .map_err(|e| ExtractError::Internal(format!("Extraction task panicked: {}", e)))?
    }

    /// Synchronous form of [`extract`](Self::extract).
    pub fn extract_blocking(&self, input: &InputDocument) -> Result<OutputDocument, ExtractError> {
        let start = Instant::now();
        let document = self
            .renderer
            .open(&input.bytes, self.config.password.as_deref())?;
        let page_count = document.page_count();
        info!("{}: {} pages", input.name, page_count);

        if page_count < 2 {
            debug!("{}: fewer than two pages, passing through", input.name);
            return Ok(OutputDocument {
                name: output_file_name(&input.name),
                bytes: Arc::clone(&input.bytes),
                kind: OutputKind::Passthrough,
                source_page_count: page_count,
            });
        }

        let pages = [
            self.render_and_encode(document.as_ref(), 0)?,
            self.render_and_encode(document.as_ref(), page_count - 1)?,
        ];
        drop(document);

        let bytes = self.composer.compose(&pages)?;
        info!(
            "{}: composed pages 1 and {} → {} bytes in {}ms",
            input.name,
            page_count,
            bytes.len(),
            start.elapsed().as_millis()
        );

        Ok(OutputDocument {
            name: output_file_name(&input.name),
            bytes: bytes.into(),
            kind: OutputKind::Composed,
            source_page_count: page_count,
        })
    }

    /// Raster lives only until it is encoded.
    fn render_and_encode(
        &self,
        document: &dyn RenderableDocument,
        index: usize,
    ) -> Result<EncodedPage, ExtractError> {
        let raster = document.render_page(index, self.config.render_scale)?;
        encode_page(&raster, self.config.jpeg_quality_percent()).map_err(|e| {
            ExtractError::CompositionFailure {
                detail: format!("JPEG encoding of page {} failed: {e}", index + 1),
            }
        })
    }

    /// Read page count and edge-page sizes without rendering.
    pub async fn inspect(&self, input: &InputDocument) -> Result<DocumentInfo, ExtractError> {
        let this = self.clone();
        let input = input.clone();
        tokio::task::spawn_blocking(move || this.inspect_blocking(&input))
            .await
            .map_err(|e| ExtractError::Internal(format!("Inspect task panicked: {}", e)))?
    }

    pub fn inspect_blocking(&self, input: &InputDocument) -> Result<DocumentInfo, ExtractError> {
        let document = self
            .renderer
            .open(&input.bytes, self.config.password.as_deref())?;
        let page_count = document.page_count();
        let size_of = |index: usize| -> Result<Option<(f32, f32)>, ExtractError> {
            if page_count == 0 {
                Ok(None)
            } else {
                document.page_size(index).map(Some)
            }
        };

        Ok(DocumentInfo {
            page_count,
            first_page_size: size_of(0)?,
            last_page_size: size_of(page_count.saturating_sub(1))?,
        })
    }
}
