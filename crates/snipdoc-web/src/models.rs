use serde::{Deserialize, Serialize};

// ── Requests ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct NameQuery {
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateFileRequest {
    #[serde(rename = "fileName")]
    pub file_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UndoRequest {
    pub file_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SaveTextRequest {
    pub text: Option<String>,
    pub file_name: Option<String>,
    pub save_location: Option<String>,
    /// Subdirectory of the documents directory for local saves.
    pub directory: Option<String>,
}

// ── Responses ───────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct TextResponse {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct ContentResponse {
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct CreateFileResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct UndoResponse {
    pub message: String,
    pub remaining_undos: usize,
}

#[derive(Debug, Serialize)]
pub struct SaveTextResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
