//! # firstlast-pdf
//!
//! Build a two-page PDF from the first and last page of each input PDF.
//!
//! Pages are rasterised with pdfium, JPEG-encoded, and placed one per page
//! in a new document written with `lopdf`. Documents with fewer than two
//! pages are returned byte-for-byte unchanged.
//!
//! ## Pipeline Overview
//!
//! ```text
//! files
//!  │
//!  ├─ 1. Select   validate type (.pdf / application/pdf) and size (≤ 20 MiB)
//!  ├─ 2. Render   rasterise page 1 and page N at 1.5× (spawn_blocking)
//!  ├─ 3. Encode   JPEG, quality 0.8
//!  ├─ 4. Compose  one image per page in a new PDF
//!  └─ 5. Output   <stem>_first_last_pages.pdf
//! ```
//!
//! Files are processed one at a time; the first failure stops the batch.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use firstlast_pdf::{
//!     batch, Extractor, ExtractionConfig, FileCandidate, NoopProgressCallback, PdfiumRenderer,
//!     Session,
//! };
//! use pdfium_provision::Provisioner;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ExtractionConfig::default();
//!     let renderer = PdfiumRenderer::initialize(&Provisioner::from_env(), None)?;
//!     let extractor = Extractor::new(Arc::new(renderer), config.clone());
//!
//!     let mut session = Session::new(config.max_file_size);
//!     for rejected in session.select(vec![FileCandidate::from_path("report.pdf").await?]) {
//!         eprintln!("{rejected}");
//!     }
//!     let results = session.process(&extractor, &NoopProgressCallback).await?;
//!     batch::write_outputs(std::path::Path::new("out"), results)?;
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `firstlast` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod batch;
pub mod config;
pub mod document;
pub mod error;
pub mod pipeline;
pub mod progress;
pub mod session;
pub mod validate;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ExtractionConfig, ExtractionConfigBuilder, PageGeometry, DEFAULT_MAX_FILE_SIZE};
pub use document::{
    format_file_size, output_file_name, InputDocument, OutputDocument, OutputKind, PageRaster,
    ProcessingResult,
};
pub use error::{BatchError, ConfigError, ExtractError, ValidationError};
pub use pipeline::compose::{LopdfComposer, PdfComposer};
pub use pipeline::extract::{DocumentInfo, Extractor};
pub use pipeline::render::{PdfRenderer, PdfiumRenderer, RenderableDocument};
pub use progress::{BatchProgressCallback, NoopProgressCallback, ProgressCallback};
pub use session::{Session, SessionState};
pub use validate::{validate_candidate, FileCandidate};
