//! Error types for the firstlast-pdf library.
//!
//! Errors are split by where they stop the work:
//!
//! * [`ValidationError`]: a candidate file is rejected at selection time and
//!   never reaches the extraction pipeline.
//! * [`ExtractError`]: one file could not be turned into an output document.
//! * [`BatchError`]: the batch as a whole stopped. A failing file is
//!   reported with its name so the caller can show it verbatim.
//! * [`ConfigError`]: builder validation failed.

use std::path::PathBuf;
use thiserror::Error;

/// A file rejected before processing.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize)]
pub enum ValidationError {
    /// Neither the media type nor the file name indicates a PDF.
    #[error("'{name}' is not a PDF file. Please select only PDF files.")]
    NotAPdf { name: String },

    /// File exceeds the configured size limit.
    #[error("File {name} exceeds the {limit_display} limit ({size} bytes).")]
    TooLarge {
        name: String,
        size: u64,
        limit: u64,
        limit_display: String,
    },
}

/// Failure while extracting the first and last page of one document.
#[derive(Debug, Error)]
pub enum ExtractError {
    // ── Input ─────────────────────────────────────────────────────────────
    /// The bytes could not be read from their source.
    #[error("Failed to read '{path}': {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The bytes could not be parsed as a PDF.
    #[error("Invalid PDF file: {detail}")]
    MalformedDocument { detail: String },

    /// The document is encrypted and no password was configured.
    #[error("PDF is encrypted and requires a password")]
    PasswordRequired,

    /// A password was configured but the document rejected it.
    #[error("Wrong password for encrypted PDF")]
    WrongPassword,

    // ── Pipeline ──────────────────────────────────────────────────────────
    /// Rasterising a page failed.
    #[error("Rendering page {page} failed: {detail}")]
    RenderFailure { page: usize, detail: String },

    /// Encoding a raster or assembling/serialising the output failed.
    #[error("Building the output PDF failed: {detail}")]
    CompositionFailure { detail: String },

    // ── Engine ────────────────────────────────────────────────────────────
    /// The PDF rendering engine could not be initialised.
    #[error(
        "PDF rendering engine unavailable: {0}\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium to use an existing copy."
    )]
    EngineUnavailable(String),

    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Failure that halts a batch.
#[derive(Debug, Error)]
pub enum BatchError {
    /// Processing was requested with nothing selected.
    #[error("Please select files to process first.")]
    NothingSelected,

    /// A file failed; the files after it were not attempted.
    #[error("Error processing {file}: {source}")]
    FileFailed {
        file: String,
        #[source]
        source: ExtractError,
    },

    /// An output document could not be written.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl BatchError {
    /// Name of the file that stopped the batch, if any.
    pub fn failed_file(&self) -> Option<&str> {
        match self {
            BatchError::FileFailed { file, .. } => Some(file),
            _ => None,
        }
    }
}

/// Invalid [`crate::ExtractionConfig`].
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Invalid configuration: {0}")]
pub struct ConfigError(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_failure_names_the_file() {
        let e = BatchError::FileFailed {
            file: "broken.pdf".into(),
            source: ExtractError::MalformedDocument {
                detail: "no xref".into(),
            },
        };
        assert_eq!(
            e.to_string(),
            "Error processing broken.pdf: Invalid PDF file: no xref"
        );
        assert_eq!(e.failed_file(), Some("broken.pdf"));
    }

    #[test]
    fn too_large_mentions_limit() {
        let e = ValidationError::TooLarge {
            name: "scan.pdf".into(),
            size: 30 * 1024 * 1024,
            limit: 20 * 1024 * 1024,
            limit_display: "20 MB".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("scan.pdf"), "got: {msg}");
        assert!(msg.contains("20 MB"), "got: {msg}");
    }

    #[test]
    fn nothing_selected_has_no_file() {
        assert_eq!(BatchError::NothingSelected.failed_file(), None);
    }

    #[test]
    fn render_failure_display() {
        let e = ExtractError::RenderFailure {
            page: 7,
            detail: "bitmap alloc".into(),
        };
        assert!(e.to_string().contains("page 7"));
    }
}
