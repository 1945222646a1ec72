use axum::Json;
use axum::extract::State;
use std::path::PathBuf;
use std::sync::Arc;

use snipdoc_core::{DEFAULT_TITLE, DocError, save_remote};

use crate::error::{ApiError, blocking};
use crate::models::{SaveTextRequest, SaveTextResponse};
use crate::state::AppState;

/// Where a snippet should be persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SaveLocation {
    Local,
    Google,
}

impl SaveLocation {
    fn parse(raw: Option<&str>) -> Result<Self, DocError> {
        match raw.map(str::to_lowercase).as_deref() {
            None | Some("local") => Ok(SaveLocation::Local),
            Some("google") => Ok(SaveLocation::Google),
            Some(_) => Err(DocError::validation(
                "Invalid save location. Use \"google\" or \"local\".",
            )),
        }
    }
}

pub async fn save_text(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SaveTextRequest>,
) -> Result<Json<SaveTextResponse>, ApiError> {
    let text = req
        .text
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError(DocError::validation("No text provided")))?;
    let location = SaveLocation::parse(req.save_location.as_deref())?;
    let file_name = req
        .file_name
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| DEFAULT_TITLE.to_string());

    match location {
        SaveLocation::Google => {
            let remote = state
                .remote
                .as_ref()
                .ok_or(ApiError(DocError::RemoteUnavailable))?;
            let file_id = save_remote(remote.as_ref(), &file_name, &text)
                .await
                .map_err(DocError::from)?;
            Ok(Json(SaveTextResponse {
                message: "Text saved to Google Drive".to_string(),
                file_id: Some(file_id),
                file_path: None,
            }))
        }
        SaveLocation::Local => {
            let dir = req.directory.filter(|d| !d.is_empty()).map(PathBuf::from);
            let store = Arc::clone(&state.store);
            let outcome =
                blocking(move || store.append(&file_name, &text, dir.as_deref())).await?;
            Ok(Json(SaveTextResponse {
                message: "Text saved locally as a .docx file".to_string(),
                file_id: None,
                file_path: Some(outcome.path.display().to_string()),
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_is_case_insensitive_and_defaults_local() {
        assert_eq!(SaveLocation::parse(None).unwrap(), SaveLocation::Local);
        assert_eq!(
            SaveLocation::parse(Some("LOCAL")).unwrap(),
            SaveLocation::Local
        );
        assert_eq!(
            SaveLocation::parse(Some("Google")).unwrap(),
            SaveLocation::Google
        );
        assert!(SaveLocation::parse(Some("dropbox")).is_err());
    }
}
