use std::path::PathBuf;
use std::time::Duration;

pub mod backend;
pub mod config_file;
pub mod docx;
pub mod error;
pub mod history;
pub mod naming;
pub mod remote;
pub mod store;

// Re-export for convenience
pub use backend::{BackendError, PdfBackend, extract_pdf_text};
pub use docx::{DocxDocument, DocxError};
pub use error::{DocError, ErrorKind};
pub use history::UndoHistory;
pub use naming::normalize_file_name;
pub use remote::{RemoteDocuments, RemoteError, save_remote};
pub use store::{AppendOutcome, DocumentStore, UndoOutcome};

/// File suffix carried by every locally managed document.
pub const MANAGED_EXTENSION: &str = ".docx";

/// Upper bound on remembered appends per document.
pub const MAX_UNDO_HISTORY: usize = 10;

/// Title used for saves that arrive without a file name.
pub const DEFAULT_TITLE: &str = "Saved PDF Text";

/// Resolved runtime configuration for the service.
#[derive(Clone)]
pub struct Config {
    pub docs_dir: PathBuf,
    pub bind: String,
    /// Directory of frontend assets served at `/`. `None` serves nothing.
    pub static_dir: Option<PathBuf>,
    pub max_upload_bytes: usize,
    /// Authorized-user `token.json` for Google Drive.
    pub google_token_file: Option<PathBuf>,
    /// Pre-issued access token; takes precedence over `google_token_file`.
    pub google_access_token: Option<String>,
    pub google_timeout_secs: u64,
}

impl Config {
    pub fn google_timeout(&self) -> Duration {
        Duration::from_secs(self.google_timeout_secs)
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("docs_dir", &self.docs_dir)
            .field("bind", &self.bind)
            .field("static_dir", &self.static_dir)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .field("google_token_file", &self.google_token_file)
            .field(
                "google_access_token",
                &self.google_access_token.as_ref().map(|_| "***"),
            )
            .field("google_timeout_secs", &self.google_timeout_secs)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            docs_dir: PathBuf::from("local_docs"),
            bind: "127.0.0.1:5000".to_string(),
            static_dir: None,
            max_upload_bytes: 50 * 1024 * 1024,
            google_token_file: None,
            google_access_token: None,
            google_timeout_secs: 30,
        }
    }
}
