use std::io::Write;
use std::path::Path;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("failed to open PDF: {0}")]
    OpenError(String),
    #[error("failed to extract text: {0}")]
    ExtractionError(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Trait for PDF text extraction backends.
///
/// Implementors return the text of every page, in page order, concatenated
/// without adding separators of their own beyond what each page yields.
pub trait PdfBackend: Send + Sync {
    /// Extract the full text content of a PDF file.
    fn extract_text(&self, path: &Path) -> Result<String, BackendError>;
}

/// Extract text from an in-memory PDF.
///
/// The payload is spooled to a temporary file for the backend; the file is
/// removed when this function returns, whether extraction succeeded or not.
pub fn extract_pdf_text(backend: &dyn PdfBackend, data: &[u8]) -> Result<String, BackendError> {
    let mut temp = tempfile::Builder::new()
        .prefix("upload-")
        .suffix(".pdf")
        .tempfile()?;
    temp.write_all(data)?;
    temp.flush()?;

    let result = backend.extract_text(temp.path());
    tracing::debug!(
        bytes = data.len(),
        ok = result.is_ok(),
        "PDF extraction finished"
    );
    result
}
