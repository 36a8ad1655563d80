//! Candidate files and the checks they pass before reaching the pipeline.
//!
//! A candidate is accepted when its media type is `application/pdf` *or* its
//! name ends in `.pdf`, and it is no larger than the configured limit.
//! Bytes are only read after a candidate has been accepted.

use crate::document::{format_file_size, InputDocument};
use crate::error::{ExtractError, ValidationError};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

pub const PDF_MEDIA_TYPE: &str = "application/pdf";

/// Where a candidate's bytes come from.
#[derive(Debug, Clone)]
pub enum Contents {
    Memory(Arc<[u8]>),
    Path(PathBuf),
}

/// A file offered for processing.
#[derive(Debug, Clone)]
pub struct FileCandidate {
    pub name: String,
    pub size: u64,
    pub media_type: Option<String>,
    pub contents: Contents,
}

impl FileCandidate {
    /// A candidate whose bytes are already in memory.
    pub fn from_bytes(
        name: impl Into<String>,
        media_type: Option<&str>,
        bytes: impl Into<Arc<[u8]>>,
    ) -> Self {
        let bytes = bytes.into();
        Self {
            name: name.into(),
            size: bytes.len() as u64,
            media_type: media_type.map(str::to_string),
            contents: Contents::Memory(bytes),
        }
    }

    /// A candidate on disk. Size comes from the file metadata; the media type
    /// is `application/pdf` when the file starts with `%PDF`.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, ExtractError> {
        let path = path.as_ref();
        let read_failed = |source| ExtractError::ReadFailed {
            path: path.to_path_buf(),
            source,
        };

        let meta = tokio::fs::metadata(path).await.map_err(read_failed)?;
        let media_type = sniff_media_type(path).await.map_err(read_failed)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        debug!(
            "Candidate {}: {} bytes, media type {:?}",
            name,
            meta.len(),
            media_type
        );

        Ok(Self {
            name,
            size: meta.len(),
            media_type,
            contents: Contents::Path(path.to_path_buf()),
        })
    }

    /// Read the bytes into an [`InputDocument`].
    pub async fn load(&self) -> Result<InputDocument, ExtractError> {
        let bytes: Arc<[u8]> = match &self.contents {
            Contents::Memory(bytes) => Arc::clone(bytes),
            Contents::Path(path) => tokio::fs::read(path)
                .await
                .map_err(|source| ExtractError::ReadFailed {
                    path: path.clone(),
                    source,
                })?
                .into(),
        };
        Ok(InputDocument::new(self.name.clone(), bytes))
    }
}

async fn sniff_media_type(path: &Path) -> std::io::Result<Option<String>> {
    use tokio::io::AsyncReadExt;

    let mut file = tokio::fs::File::open(path).await?;
    let mut magic = [0u8; 4];
    let mut filled = 0;
    while filled < magic.len() {
        let n = file.read(&mut magic[filled..]).await?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok((&magic[..filled] == b"%PDF").then(|| PDF_MEDIA_TYPE.to_string()))
}

/// Check a candidate against the PDF type rule and the size limit.
pub fn validate_candidate(candidate: &FileCandidate, max_size: u64) -> Result<(), ValidationError> {
    let typed_pdf = candidate
        .media_type
        .as_deref()
        .is_some_and(|t| t.eq_ignore_ascii_case(PDF_MEDIA_TYPE));
    let named_pdf = candidate.name.to_lowercase().ends_with(".pdf");

    if !typed_pdf && !named_pdf {
        return Err(ValidationError::NotAPdf {
            name: candidate.name.clone(),
        });
    }

    if candidate.size > max_size {
        return Err(ValidationError::TooLarge {
            name: candidate.name.clone(),
            size: candidate.size,
            limit: max_size,
            limit_display: format_file_size(max_size),
        });
    }

    Ok(())
}

/// Split candidates into accepted files and rejections, keeping order.
pub fn partition_candidates(
    candidates: impl IntoIterator<Item = FileCandidate>,
    max_size: u64,
) -> (Vec<FileCandidate>, Vec<ValidationError>) {
    let mut accepted = Vec::new();
    let mut rejected = Vec::new();
    for candidate in candidates {
        match validate_candidate(&candidate, max_size) {
            Ok(()) => accepted.push(candidate),
            Err(e) => rejected.push(e),
        }
    }
    (accepted, rejected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_MAX_FILE_SIZE;

    fn candidate(name: &str, media_type: Option<&str>, size: u64) -> FileCandidate {
        FileCandidate {
            name: name.into(),
            size,
            media_type: media_type.map(str::to_string),
            contents: Contents::Memory(Arc::from(&b""[..])),
        }
    }

    #[test]
    fn accepts_pdf_by_name_or_type() {
        assert!(validate_candidate(&candidate("a.pdf", None, 10), DEFAULT_MAX_FILE_SIZE).is_ok());
        assert!(validate_candidate(&candidate("A.PDF", None, 10), DEFAULT_MAX_FILE_SIZE).is_ok());
        assert!(validate_candidate(
            &candidate("blob", Some("application/pdf"), 10),
            DEFAULT_MAX_FILE_SIZE
        )
        .is_ok());
    }

    #[test]
    fn rejects_non_pdf() {
        let err = validate_candidate(&candidate("notes.txt", Some("text/plain"), 10), DEFAULT_MAX_FILE_SIZE)
            .unwrap_err();
        assert_eq!(
            err,
            ValidationError::NotAPdf {
                name: "notes.txt".into()
            }
        );
    }

    #[test]
    fn size_limit_is_inclusive() {
        let at_limit = candidate("big.pdf", None, DEFAULT_MAX_FILE_SIZE);
        assert!(validate_candidate(&at_limit, DEFAULT_MAX_FILE_SIZE).is_ok());

        let over = candidate("bigger.pdf", None, DEFAULT_MAX_FILE_SIZE + 1);
        assert!(matches!(
            validate_candidate(&over, DEFAULT_MAX_FILE_SIZE),
            Err(ValidationError::TooLarge { .. })
        ));
    }

    #[test]
    fn partition_keeps_order() {
        let (ok, bad) = partition_candidates(
            vec![
                candidate("1.pdf", None, 1),
                candidate("2.doc", None, 1),
                candidate("3.pdf", None, 1),
                candidate("4.pdf", None, u64::MAX),
            ],
            DEFAULT_MAX_FILE_SIZE,
        );
        let names: Vec<_> = ok.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["1.pdf", "3.pdf"]);
        assert_eq!(bad.len(), 2);
    }

    #[tokio::test]
    async fn from_path_sniffs_pdf_magic() {
        let dir = tempfile::tempdir().unwrap();
        let pdf = dir.path().join("no_extension");
        std::fs::write(&pdf, b"%PDF-1.7\n...").unwrap();
        let other = dir.path().join("plain.bin");
        std::fs::write(&other, b"hello").unwrap();

        let c = FileCandidate::from_path(&pdf).await.unwrap();
        assert_eq!(c.name, "no_extension");
        assert_eq!(c.size, 12);
        assert_eq!(c.media_type.as_deref(), Some(PDF_MEDIA_TYPE));
        assert!(validate_candidate(&c, DEFAULT_MAX_FILE_SIZE).is_ok());

        let c = FileCandidate::from_path(&other).await.unwrap();
        assert_eq!(c.media_type, None);
        assert!(validate_candidate(&c, DEFAULT_MAX_FILE_SIZE).is_err());
    }

    #[tokio::test]
    async fn from_path_missing_file_is_read_failure() {
        let err = FileCandidate::from_path("/definitely/not/here.pdf")
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractError::ReadFailed { .. }));
    }

    #[tokio::test]
    async fn load_reads_bytes_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.pdf");
        std::fs::write(&path, b"%PDF-1.4 body").unwrap();

        let doc = FileCandidate::from_path(&path).await.unwrap().load().await.unwrap();
        assert_eq!(doc.name, "doc.pdf");
        assert_eq!(&doc.bytes[..], b"%PDF-1.4 body");
    }
}
