//! Turning uploaded files into document text.

use std::path::Path;

use docqa_rag::{Document, RagError, Result};
use tracing::{debug, info, warn};

/// Converts the raw bytes of an uploaded file into plain text.
pub trait TextExtractor: Send + Sync {
    /// Short format name for logs ("pdf", "text").
    fn format(&self) -> &'static str;

    /// Extract the full text of the document.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ExtractionError`] if the bytes cannot be decoded.
    fn extract_text(&self, bytes: &[u8]) -> Result<String>;
}

/// Extracts PDF text page by page with `lopdf`.
///
/// Page texts are concatenated in page order and every page, including the
/// last, is followed by a newline. Pages without a text layer (scanned images)
/// contribute an empty line.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfTextExtractor;

impl TextExtractor for PdfTextExtractor {
    fn format(&self) -> &'static str {
        "pdf"
    }

    fn extract_text(&self, bytes: &[u8]) -> Result<String> {
        let document = lopdf::Document::load_mem(bytes)
            .map_err(|e| RagError::ExtractionError(format!("not a readable PDF: {e}")))?;
        if document.is_encrypted() {
            return Err(RagError::ExtractionError("encrypted PDFs are not supported".into()));
        }

        let pages = document.get_pages();
        debug!(page_count = pages.len(), "extracting PDF text");

        let mut text = String::new();
        for page_number in pages.keys() {
            match document.extract_text(&[*page_number]) {
                Ok(page_text) => text.push_str(&page_text),
                Err(e) => warn!(page = page_number, error = %e, "page has no extractable text"),
            }
            text.push('\n');
        }
        Ok(text)
    }
}

/// Accepts UTF-8 text files as they are.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    fn format(&self) -> &'static str {
        "text"
    }

    fn extract_text(&self, bytes: &[u8]) -> Result<String> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| RagError::ExtractionError(format!("file is not valid UTF-8: {e}")))?;
        Ok(text.strip_prefix('\u{feff}').unwrap_or(text).to_string())
    }
}

/// Pick an extractor from the file extension.
///
/// `.pdf` goes to [`PdfTextExtractor`]; `.txt`, `.md` and files without an
/// extension go to [`PlainTextExtractor`].
pub fn extractor_for(path: &Path) -> Result<Box<dyn TextExtractor>> {
    let extension = path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("pdf") => Ok(Box::new(PdfTextExtractor)),
        Some("txt" | "md" | "text") | None => Ok(Box::new(PlainTextExtractor)),
        Some(other) => {
            Err(RagError::ExtractionError(format!("unsupported file type: .{other}")))
        }
    }
}

/// Read `path` and extract its text into a [`Document`].
pub async fn load_document(path: &Path) -> Result<Document> {
    let extractor = extractor_for(path)?;
    let bytes = tokio::fs::read(path).await.map_err(|e| {
        RagError::ExtractionError(format!("cannot read {}: {e}", path.display()))
    })?;

    let text = extractor.extract_text(&bytes)?;
    info!(
        path = %path.display(),
        format = extractor.format(),
        chars = text.chars().count(),
        "extracted document text"
    );
    Ok(Document::new(text).with_source(path.display().to_string()))
}
