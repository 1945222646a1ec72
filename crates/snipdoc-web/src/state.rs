use std::path::PathBuf;
use std::sync::Arc;

use snipdoc_core::{DocumentStore, PdfBackend, RemoteDocuments};

/// Shared application state accessible from all handlers.
pub struct AppState {
    pub store: Arc<DocumentStore>,
    pub pdf: Arc<dyn PdfBackend>,
    /// `None` when no Google credentials are configured.
    pub remote: Option<Arc<dyn RemoteDocuments>>,
    pub static_dir: Option<PathBuf>,
    pub max_upload_bytes: usize,
}
