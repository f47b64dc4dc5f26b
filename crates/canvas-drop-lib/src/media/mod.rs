//! Local files selected for upload, and how they can be previewed.

use std::fmt;
use std::path::Path;

use bytes::Bytes;

use crate::errors::{CanvasDropError, Result};

const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// A file blob ready to upload: name, MIME type and contents.
#[derive(Debug, Clone)]
pub struct UploadFile {
    name: String,
    content_type: String,
    data: Bytes,
}

impl UploadFile {
    pub fn new(name: impl Into<String>, content_type: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            data: data.into(),
        }
    }

    /// Read a file from disk, guessing its MIME type from the extension.
    pub async fn from_path(path: &Path) -> Result<Self> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                CanvasDropError::Command(format!("Not a file path: {}", path.display()))
            })?
            .to_string();
        let data = tokio::fs::read(path).await?;
        let content_type = guess_content_type(&name);
        tracing::debug!(%name, %content_type, size = data.len(), "Loaded file");
        Ok(Self::new(name, content_type, data))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    /// Contents as a cheaply clonable buffer.
    pub fn data(&self) -> Bytes {
        self.data.clone()
    }
}

/// MIME type for a file name, or `application/octet-stream` when unknown.
pub fn guess_content_type(name: &str) -> String {
    mime_guess::from_path(name)
        .first()
        .map(|m| m.essence_str().to_string())
        .unwrap_or_else(|| FALLBACK_CONTENT_TYPE.to_string())
}

/// How a selected file can be shown inline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewKind {
    Image,
    Pdf,
    Video,
    Unsupported,
}

impl PreviewKind {
    /// Images and videos are recognised by MIME type; PDFs by file name.
    pub fn classify(name: &str, content_type: &str) -> Self {
        if content_type.starts_with("image/") {
            PreviewKind::Image
        } else if name.to_lowercase().ends_with(".pdf") {
            PreviewKind::Pdf
        } else if content_type.starts_with("video/") {
            PreviewKind::Video
        } else {
            PreviewKind::Unsupported
        }
    }

    pub fn is_previewable(self) -> bool {
        self != PreviewKind::Unsupported
    }
}

impl fmt::Display for PreviewKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PreviewKind::Image => write!(f, "image"),
            PreviewKind::Pdf => write!(f, "pdf"),
            PreviewKind::Video => write!(f, "video"),
            PreviewKind::Unsupported => write!(f, "unsupported"),
        }
    }
}

/// Open a previewable file in the default browser via a `file://` URL.
///
/// Returns the kind that was detected; nothing is opened for
/// `PreviewKind::Unsupported`.
pub fn open_preview(path: &Path) -> Result<PreviewKind> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    let kind = PreviewKind::classify(name, &guess_content_type(name));
    if !kind.is_previewable() {
        return Ok(kind);
    }

    let absolute = std::fs::canonicalize(path)?;
    let url = reqwest::Url::from_file_path(&absolute).map_err(|_| {
        CanvasDropError::Command(format!("Cannot build a file URL for {}", absolute.display()))
    })?;
    tracing::debug!(%url, %kind, "Opening preview");
    webbrowser::open(url.as_str())?;
    Ok(kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_image_by_mime() {
        assert_eq!(PreviewKind::classify("photo.bin", "image/png"), PreviewKind::Image);
    }

    #[test]
    fn test_classify_pdf_by_name_case_insensitive() {
        assert_eq!(
            PreviewKind::classify("REPORT.PDF", "application/octet-stream"),
            PreviewKind::Pdf
        );
    }

    #[test]
    fn test_classify_image_wins_over_pdf_name() {
        // MIME type is checked before the name.
        assert_eq!(PreviewKind::classify("scan.pdf", "image/jpeg"), PreviewKind::Image);
    }

    #[test]
    fn test_classify_video_and_unsupported() {
        assert_eq!(PreviewKind::classify("clip.mp4", "video/mp4"), PreviewKind::Video);
        assert_eq!(
            PreviewKind::classify("notes.docx", "application/msword"),
            PreviewKind::Unsupported
        );
        assert!(!PreviewKind::Unsupported.is_previewable());
    }

    #[test]
    fn test_guess_content_type() {
        assert_eq!(guess_content_type("report.pdf"), "application/pdf");
        assert_eq!(guess_content_type("photo.png"), "image/png");
        assert_eq!(guess_content_type("no_extension"), FALLBACK_CONTENT_TYPE);
    }

    #[tokio::test]
    async fn test_from_path_reads_metadata() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("report.pdf");
        std::fs::write(&path, b"%PDF-1.7 hello").unwrap();

        let file = UploadFile::from_path(&path).await.unwrap();
        assert_eq!(file.name(), "report.pdf");
        assert_eq!(file.content_type(), "application/pdf");
        assert_eq!(file.size(), 14);
        assert_eq!(&file.data()[..], b"%PDF-1.7 hello");
    }

    #[tokio::test]
    async fn test_from_path_missing_file() {
        let err = UploadFile::from_path(Path::new("/definitely/not/here.txt"))
            .await
            .unwrap_err();
        assert!(matches!(err, CanvasDropError::Io(_)));
    }

    #[test]
    fn test_open_preview_unsupported_opens_nothing() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("archive.zip");
        std::fs::write(&path, b"PK").unwrap();
        assert_eq!(open_preview(&path).unwrap(), PreviewKind::Unsupported);
    }
}
