use thiserror::Error;

use crate::backend::BackendError;
use crate::docx::DocxError;
use crate::remote::RemoteError;

/// Every failure a document operation can report.
#[derive(Error, Debug)]
pub enum DocError {
    #[error("{0}")]
    Validation(String),
    #[error("File not found")]
    NotFound(String),
    #[error("File already exists")]
    AlreadyExists(String),
    #[error("No text to undo")]
    NothingToUndo,
    #[error("Document is already empty")]
    DocumentEmpty,
    #[error("Last added text not found in file")]
    UndoTextMissing,
    #[error("document error: {0}")]
    Docx(#[from] DocxError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Pdf(#[from] BackendError),
    #[error("{0}")]
    Remote(#[from] RemoteError),
    #[error("Google Drive is not configured")]
    RemoteUnavailable,
}

/// Coarse classification of [`DocError`], used to pick a response status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing or malformed input.
    Validation,
    NotFound,
    /// The request conflicts with current document or history state.
    State,
    /// The recorded undo text is no longer in the document.
    Consistency,
    /// A library, filesystem or remote API failed.
    External,
}

impl DocError {
    pub fn validation(msg: impl Into<String>) -> Self {
        DocError::Validation(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            DocError::Validation(_) => ErrorKind::Validation,
            DocError::NotFound(_) => ErrorKind::NotFound,
            DocError::AlreadyExists(_) | DocError::NothingToUndo | DocError::DocumentEmpty => {
                ErrorKind::State
            }
            DocError::UndoTextMissing => ErrorKind::Consistency,
            DocError::Docx(_)
            | DocError::Io(_)
            | DocError::Pdf(_)
            | DocError::Remote(_)
            | DocError::RemoteUnavailable => ErrorKind::External,
        }
    }
}
