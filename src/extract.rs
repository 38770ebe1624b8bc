//! Text extraction from files on disk.
//!
//! PDFs (by `.pdf` extension) are split into pages so each chunk can carry
//! its page number. Everything else is read as UTF-8 text.

use std::path::Path;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{path} is not valid UTF-8 text")]
    NotUtf8 { path: String },
    #[error("PDF extraction failed for {path}: {message}")]
    Pdf { path: String, message: String },
}

/// Extracted document content.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentText {
    /// One string per PDF page, in page order.
    Pages(Vec<String>),
    Plain(String),
}

impl DocumentText {
    pub fn is_empty(&self) -> bool {
        match self {
            DocumentText::Pages(pages) => pages.iter().all(|p| p.trim().is_empty()),
            DocumentText::Plain(text) => text.trim().is_empty(),
        }
    }
}

pub fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false)
}

/// Read `path` into text, page-split for PDFs.
pub fn load_document(path: &Path) -> Result<DocumentText, ExtractError> {
    let display = path.display().to_string();
    let bytes = std::fs::read(path).map_err(|source| ExtractError::Io {
        path: display.clone(),
        source,
    })?;

    if is_pdf(path) {
        let pages = extract_pdf_pages(&bytes).map_err(|message| ExtractError::Pdf {
            path: display,
            message,
        })?;
        return Ok(DocumentText::Pages(pages));
    }

    String::from_utf8(bytes)
        .map(DocumentText::Plain)
        .map_err(|_| ExtractError::NotUtf8 { path: display })
}

/// Per-page text of an in-memory PDF.
pub fn extract_pdf_pages(bytes: &[u8]) -> Result<Vec<String>, String> {
    pdf_extract::extract_text_from_mem_by_pages(bytes).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_text_file_is_plain() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.md");
        std::fs::write(&path, "# Notes\n\nSome text.").unwrap();
        assert_eq!(
            load_document(&path).unwrap(),
            DocumentText::Plain("# Notes\n\nSome text.".to_string())
        );
    }

    #[test]
    fn test_binary_non_pdf_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("blob.bin");
        std::fs::write(&path, [0xff, 0xfe, 0x00, 0x80]).unwrap();
        assert!(matches!(
            load_document(&path),
            Err(ExtractError::NotUtf8 { .. })
        ));
    }

    #[test]
    fn test_missing_file() {
        let err = load_document(Path::new("/nonexistent/positron/file.txt")).unwrap_err();
        assert!(matches!(err, ExtractError::Io { .. }));
    }

    #[test]
    fn test_garbage_pdf_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.PDF");
        std::fs::write(&path, b"not a pdf at all").unwrap();
        assert!(is_pdf(&path));
        assert!(matches!(load_document(&path), Err(ExtractError::Pdf { .. })));
    }

    #[test]
    fn test_empty_detection() {
        assert!(DocumentText::Plain("  \n".into()).is_empty());
        assert!(DocumentText::Pages(vec![String::new(), " ".into()]).is_empty());
        assert!(!DocumentText::Pages(vec![String::new(), "x".into()]).is_empty());
    }
}
